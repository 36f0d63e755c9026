//! Textual description of the queried database, embedded in every prompt.
//!
//! The schema belongs to the external database; this text is the only
//! knowledge the model gets about it.

/// Tables, columns and the implied relationships, grouped the way analysts
/// read them: lookup tables first, then the core sales tables.
pub const DATABASE_SCHEMA: &str = r#"
Database Schema:

LOOKUP TABLES:
- ProductCategory(ProductCategoryID, ProductCategory, ProductCategoryDescription)

CORE TABLES:
- Region(RegionID, Region)
- Country(CountryID, Country, RegionID)
- Customer(CustomerID, FirstName, LastName, Address, City, CountryID)
- Product(ProductID, ProductName, ProductUnitPrice, ProductCategoryID)
- OrderDetail(OrderID, CustomerID, ProductID, OrderDate, QuantityOrdered)

RELATIONSHIPS:
- Country.RegionID -> Region.RegionID
- Customer.CountryID -> Country.CountryID
- Product.ProductCategoryID -> ProductCategory.ProductCategoryID
- OrderDetail.CustomerID -> Customer.CustomerID
- OrderDetail.ProductID -> Product.ProductID
"#;
