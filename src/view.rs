//! Server-rendered page. One function of [`Render`] to HTML.

use std::fmt::Write;

use crate::db::ResultTable;
use crate::service::{Notice, NoticeKind, Render, UiState};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #1f2328; }
textarea, input[type=password] { width: 100%; box-sizing: border-box; padding: .5rem; font: inherit; }
textarea { min-height: 6rem; }
button { margin-top: .5rem; padding: .4rem 1rem; font: inherit; cursor: pointer; }
pre { background: #f6f8fa; padding: 1rem; overflow-x: auto; }
table { border-collapse: collapse; width: 100%; margin-top: 1rem; }
th, td { border: 1px solid #d0d7de; padding: .3rem .6rem; text-align: left; }
th { background: #f6f8fa; }
.notice { padding: .6rem 1rem; margin: 1rem 0; border-radius: 4px; }
.notice.error { background: #ffebe9; color: #82071e; }
.notice.info { background: #ddf4ff; color: #0a3069; }
.null { color: #8c959f; font-style: italic; }
.busy { margin-left: .5rem; color: #57606a; }
.topbar { display: flex; justify-content: flex-end; }
"#;

// Disable the form's buttons and show its progress label while the request runs.
const SCRIPT: &str = r#"
document.querySelectorAll("form[data-busy]").forEach(function (form) {
  form.addEventListener("submit", function () {
    form.querySelectorAll("button").forEach(function (b) { b.disabled = true; });
    var label = form.querySelector(".busy");
    if (label) { label.textContent = form.dataset.busy; }
  });
});
"#;

pub fn render_page(render: &Render) -> String {
    let mut body = String::new();
    match &render.state {
        UiState::LoggedOut => login_section(&mut body, render.notice.as_ref()),
        state => assistant_section(&mut body, state, &render.question, render.notice.as_ref()),
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>SQL Query Assistant</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         {body}<script>{SCRIPT}</script>\n</body>\n</html>\n"
    )
}

fn login_section(out: &mut String, notice: Option<&Notice>) {
    out.push_str("<h1>🔐 Secure Login</h1>\n");
    out.push_str(
        "<form method=\"post\" action=\"/login\">\n\
         <label for=\"password\">Enter password:</label>\n\
         <input type=\"password\" id=\"password\" name=\"password\" autofocus>\n\
         <button type=\"submit\">Login</button>\n</form>\n",
    );
    notice_block(out, notice);
}

fn assistant_section(out: &mut String, state: &UiState, question: &str, notice: Option<&Notice>) {
    out.push_str(
        "<div class=\"topbar\"><form method=\"post\" action=\"/logout\">\
         <button type=\"submit\">Logout</button></form></div>\n",
    );
    out.push_str("<h1>🤖 AI-Powered SQL Query Assistant</h1>\n");
    let _ = write!(
        out,
        "<form method=\"post\" action=\"/generate\" data-busy=\"Generating SQL...\">\n\
         <label for=\"question\">Ask a question:</label>\n\
         <textarea id=\"question\" name=\"question\">{}</textarea>\n\
         <button type=\"submit\">Generate SQL</button><span class=\"busy\"></span>\n</form>\n",
        escape_html(question)
    );

    let (sql, table) = match state {
        UiState::SqlGenerated { sql } => (Some(sql), None),
        UiState::ResultShown { sql, table } => (Some(sql), Some(table)),
        UiState::Idle | UiState::LoggedOut => (None, None),
    };

    if let Some(sql) = sql {
        let _ = write!(
            out,
            "<pre><code class=\"language-sql\">{}</code></pre>\n\
             <form method=\"post\" action=\"/run\" data-busy=\"Running query...\">\
             <button type=\"submit\">Run Query</button><span class=\"busy\"></span></form>\n",
            escape_html(sql)
        );
    }

    notice_block(out, notice);

    if let Some(table) = table {
        table_block(out, table);
    }
}

fn notice_block(out: &mut String, notice: Option<&Notice>) {
    let Some(notice) = notice else {
        return;
    };
    let class = match notice.kind {
        NoticeKind::Error => "error",
        NoticeKind::Info => "info",
    };
    let _ = writeln!(
        out,
        "<div class=\"notice {class}\" role=\"alert\">{}</div>",
        escape_html(&notice.text)
    );
}

fn table_block(out: &mut String, table: &ResultTable) {
    if table.columns.is_empty() {
        return;
    }
    out.push_str("<table>\n<thead><tr>");
    for column in &table.columns {
        let _ = write!(out, "<th>{}</th>", escape_html(column));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            match cell {
                Some(value) => {
                    let _ = write!(out, "<td>{}</td>", escape_html(value));
                }
                None => out.push_str("<td class=\"null\">NULL</td>"),
            }
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(state: UiState, question: &str, notice: Option<Notice>) -> String {
        render_page(&Render {
            state,
            question: question.to_string(),
            notice,
        })
    }

    #[test]
    fn logged_out_page_shows_only_login_form() {
        let html = render(UiState::LoggedOut, "", Some(Notice::error("Incorrect password ❌")));
        assert!(html.contains("action=\"/login\""));
        assert!(html.contains("type=\"password\""));
        assert!(html.contains("Incorrect password ❌"));
        assert!(!html.contains("action=\"/generate\""));
        assert!(!html.contains("action=\"/run\""));
    }

    #[test]
    fn idle_page_has_no_run_button() {
        let html = render(UiState::Idle, "", None);
        assert!(html.contains("Generate SQL"));
        assert!(!html.contains("Run Query"));
    }

    #[test]
    fn generated_sql_is_escaped_in_code_block() {
        let html = render(
            UiState::SqlGenerated {
                sql: "SELECT * FROM Customer WHERE City <> 'Paris';".into(),
            },
            "not <b>bold</b>",
            None,
        );
        assert!(html.contains(
            "<code class=\"language-sql\">SELECT * FROM Customer WHERE City &lt;&gt; &#39;Paris&#39;;</code>"
        ));
        assert!(html.contains("not &lt;b&gt;bold&lt;/b&gt;</textarea>"));
        assert!(html.contains("Run Query"));
    }

    #[test]
    fn result_table_renders_rows_and_nulls() {
        let table = ResultTable::new(
            vec!["FirstName".into(), "City".into()],
            vec![
                vec![Some("Ana".into()), Some("Lyon".into())],
                vec![Some("Bo".into()), None],
            ],
        );
        let html = render(
            UiState::ResultShown {
                sql: "SELECT FirstName, City FROM Customer".into(),
                table,
            },
            "who?",
            None,
        );
        assert!(html.contains("<th>FirstName</th><th>City</th>"));
        assert!(html.contains("<tr><td>Ana</td><td>Lyon</td></tr>"));
        assert!(html.contains("<tr><td>Bo</td><td class=\"null\">NULL</td></tr>"));
    }
}
