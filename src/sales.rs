use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::Result;

/// Sale price as stored
/// SQLite keeps whichever storage class the loader wrote, and the wire
/// format preserves it (`500000` stays `500000`, not `500000.0`)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Price {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Default for Price {
    fn default() -> Self {
        Price::Integer(0)
    }
}

impl FromSql for Price {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(v) => Ok(Price::Integer(v)),
            ValueRef::Real(v) => Ok(Price::Real(v)),
            ValueRef::Text(v) => std::str::from_utf8(v)
                .map(|text| Price::Text(text.to_owned()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// One completed property sale
/// Externally loaded rows may leave any measured field NULL
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    pub sale_price: Option<Price>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub year_sold: i64,
}

impl SaleRecord {
    /// Projection sent to the heat map (the year is implied by the request)
    pub fn point(&self) -> SalePoint {
        SalePoint {
            sale_price: self.sale_price.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Heat map point, keyed on the wire by the column names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalePoint {
    #[serde(rename = "SALE_PRICE")]
    pub sale_price: Option<Price>,

    #[serde(rename = "LATITUDE")]
    pub latitude: Option<f64>,

    #[serde(rename = "LONGITUDE")]
    pub longitude: Option<f64>,
}

/// Span of years present in the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min_year: i64,
    pub max_year: i64,
}

/// MIN/MAX of YEAR_SOLD; (0, 0) when the table is empty
pub fn year_range(conn: &Connection) -> Result<YearRange> {
    // Aggregates always yield one row; both columns are NULL on an empty table
    let range = conn.query_row(
        "SELECT MIN(YEAR_SOLD) AS min_year, MAX(YEAR_SOLD) AS max_year FROM ManhattanSales",
        [],
        |row| {
            let min_year: Option<i64> = row.get("min_year")?;
            let max_year: Option<i64> = row.get("max_year")?;
            Ok(YearRange {
                min_year: min_year.unwrap_or(0),
                max_year: max_year.unwrap_or(0),
            })
        },
    )?;

    Ok(range)
}

/// Every sale recorded in `year`
pub fn sales_for_year(conn: &Connection, year: i64) -> Result<Vec<SalePoint>> {
    let mut stmt = conn.prepare(
        "SELECT SALE_PRICE, LATITUDE, LONGITUDE
         FROM ManhattanSales
         WHERE YEAR_SOLD = ?1",
    )?;

    let records = stmt
        .query_map(params![year], |row| {
            Ok(SaleRecord {
                sale_price: row.get("SALE_PRICE")?,
                latitude: row.get("LATITUDE")?,
                longitude: row.get("LONGITUDE")?,
                year_sold: year,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(records.iter().map(SaleRecord::point).collect())
}

/// Highest sale price across the whole table, used to scale the heat map
pub fn max_price(conn: &Connection) -> Result<Price> {
    let price: Option<Price> = conn.query_row(
        "SELECT MAX(SALE_PRICE) AS max_price FROM ManhattanSales",
        [],
        |row| row.get("max_price"),
    )?;

    Ok(price.unwrap_or_default())
}
