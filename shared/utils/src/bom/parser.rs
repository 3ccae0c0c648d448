//! Table Parser
//!
//! Reads CSV, Excel and XML tables into raw, header-keyed rows. Headers are
//! lower-cased and trimmed; cell values are kept as text.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Supported table file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Excel, // XLSX/XLS
    Xml,
}

impl TableFormat {
    /// Detect format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" => Some(Self::Excel),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

/// One data row, keyed by normalized header
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub row_number: usize,
    pub values: HashMap<String, String>,
}

impl RawRow {
    pub fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }
}

/// Complete parsed table with metadata
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub name: String,
    pub format: TableFormat,
    pub column_headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub parse_warnings: Vec<String>,
}

/// Main table parser
pub struct TableParser {
    /// Candidate header names for the item identifier, in priority order
    identifier_columns: Vec<String>,
    /// Candidate header names for the line quantity
    quantity_columns: Vec<String>,
}

impl Default for TableParser {
    fn default() -> Self {
        let config = crate::config::BomConfig::default();
        Self::new(&config.identifier_columns, &config.quantity_columns)
    }
}

impl TableParser {
    pub fn new(identifier_columns: &[String], quantity_columns: &[String]) -> Self {
        Self {
            identifier_columns: identifier_columns.iter().map(|c| normalize_header(c)).collect(),
            quantity_columns: quantity_columns.iter().map(|c| normalize_header(c)).collect(),
        }
    }

    /// Parse a table from bytes; `name` is the table name used in diagnostics.
    pub fn parse_bytes(&self, name: &str, data: &[u8], format: TableFormat) -> Result<ParsedTable> {
        match format {
            TableFormat::Csv => self.parse_csv(name, data),
            TableFormat::Excel => self.parse_excel(name, data),
            TableFormat::Xml => self.parse_xml(name, data),
        }
    }

    /// Parse every sheet of a workbook on disk, in sheet order.
    pub fn parse_workbook(&self, path: &Path) -> Result<Vec<ParsedTable>> {
        use calamine::{open_workbook_auto, Reader};

        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("Failed to open workbook {}", path.display()))?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut tables = Vec::with_capacity(sheet_names.len());
        for sheet_name in sheet_names {
            let range = workbook
                .worksheet_range(&sheet_name)
                .with_context(|| format!("Sheet {} not found", sheet_name))?
                .with_context(|| format!("Failed to read sheet {}", sheet_name))?;
            tables.push(self.range_to_table(&sheet_name, &range)?);
        }
        Ok(tables)
    }

    /// Parse CSV format
    fn parse_csv(&self, name: &str, data: &[u8]) -> Result<ParsedTable> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(data);

        let headers: Vec<String> = reader
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(normalize_header)
            .collect();

        let mut rows = Vec::new();
        let mut warnings = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            match result {
                Ok(record) => {
                    let row = RawRow {
                        row_number: idx + 2,
                        values: zip_row(&headers, record.iter()),
                    };
                    if !row.is_blank() {
                        rows.push(row);
                    }
                }
                Err(e) => {
                    warnings.push(format!("Row {}: Parse error - {}", idx + 2, e));
                }
            }
        }

        Ok(ParsedTable {
            name: name.to_string(),
            format: TableFormat::Csv,
            column_headers: headers,
            rows,
            parse_warnings: warnings,
        })
    }

    /// Parse Excel format, first sheet only. The reader (XLS, XLSX/XLSM, XLSB)
    /// is chosen from the content, not the file extension.
    fn parse_excel(&self, name: &str, data: &[u8]) -> Result<ParsedTable> {
        use calamine::{open_workbook_auto_from_rs, Reader};

        let cursor = std::io::Cursor::new(data);
        let mut workbook = open_workbook_auto_from_rs(cursor).context("Failed to open Excel workbook")?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .context("No sheets found in workbook")?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .context("Failed to read worksheet")??;

        self.range_to_table(name, &range)
    }

    fn range_to_table(&self, name: &str, range: &calamine::Range<calamine::DataType>) -> Result<ParsedTable> {
        let mut rows_iter = range.rows();

        // First row is headers
        let headers: Vec<String> = rows_iter
            .next()
            .with_context(|| format!("Empty worksheet {}", name))?
            .iter()
            .map(|cell| normalize_header(&cell.to_string()))
            .collect();

        let rows = rows_iter
            .enumerate()
            .map(|(idx, row)| RawRow {
                row_number: idx + 2,
                values: zip_row(&headers, row.iter().map(|cell| cell.to_string())),
            })
            .filter(|row| !row.is_blank())
            .collect();

        Ok(ParsedTable {
            name: name.to_string(),
            format: TableFormat::Excel,
            column_headers: headers,
            rows,
            parse_warnings: Vec::new(),
        })
    }

    /// Parse XML format
    fn parse_xml(&self, name: &str, data: &[u8]) -> Result<ParsedTable> {
        use quick_xml::events::Event;
        use quick_xml::Reader;

        let mut reader = Reader::from_reader(data);
        reader.trim_text(true);

        let mut rows = Vec::new();
        let mut warnings = Vec::new();
        let mut headers: Vec<String> = Vec::new();
        let mut current_row: Option<HashMap<String, String>> = None;
        let mut current_element = String::new();
        let mut row_number = 0;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    if is_row_element(&tag_name) {
                        current_row = Some(HashMap::new());
                        row_number += 1;
                    } else if current_row.is_some() {
                        current_element = normalize_header(&tag_name);
                        if !headers.contains(&current_element) {
                            headers.push(current_element.clone());
                        }
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(ref mut row) = current_row {
                        if !current_element.is_empty() {
                            row.insert(current_element.clone(), e.unescape().unwrap_or_default().to_string());
                        }
                    }
                }
                Ok(Event::End(ref e)) => {
                    let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    if is_row_element(&tag_name) {
                        if let Some(values) = current_row.take() {
                            let row = RawRow { row_number, values };
                            if !row.is_blank() {
                                rows.push(row);
                            }
                        }
                    }
                    current_element.clear();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    warnings.push(format!("XML parse error: {}", e));
                    break;
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(ParsedTable {
            name: name.to_string(),
            format: TableFormat::Xml,
            column_headers: headers,
            rows,
            parse_warnings: warnings,
        })
    }

    /// Item identifier of a row, if any candidate column holds a value
    pub fn identifier(&self, row: &RawRow) -> Option<String> {
        find_value(&self.identifier_columns, &row.values)
    }

    /// Raw quantity text of a row, if any candidate column holds a value
    pub fn quantity(&self, row: &RawRow) -> Option<String> {
        find_value(&self.quantity_columns, &row.values)
    }

    pub fn is_identifier_column(&self, header: &str) -> bool {
        self.identifier_columns.iter().any(|c| c == header)
    }

    pub fn is_quantity_column(&self, header: &str) -> bool {
        self.quantity_columns.iter().any(|c| c == header)
    }
}

fn is_row_element(tag_name: &str) -> bool {
    matches!(tag_name, "row" | "item" | "entry" | "record")
}

pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

fn zip_row<I, S>(headers: &[String], cells: I) -> HashMap<String, String>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    headers
        .iter()
        .zip(cells)
        .filter(|(h, _)| !h.is_empty())
        .map(|(h, v)| (h.clone(), v.as_ref().trim().to_string()))
        .collect()
}

/// Find value by checking multiple possible column names
fn find_value(candidates: &[String], data: &HashMap<String, String>) -> Option<String> {
    for candidate in candidates {
        if let Some(value) = data.get(candidate) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(TableFormat::from_extension(Path::new("Cart.csv")), Some(TableFormat::Csv));
        assert_eq!(TableFormat::from_extension(Path::new("Parts list.XLSX")), Some(TableFormat::Excel));
        assert_eq!(TableFormat::from_extension(Path::new("Cart.xml")), Some(TableFormat::Xml));
        assert_eq!(TableFormat::from_extension(Path::new("notes.txt")), None);
        assert_eq!(TableFormat::from_extension(Path::new("Makefile")), None);
    }

    #[test]
    fn test_csv_parsing() {
        let csv_data = b"PN,Description,QTY\n17954-1,Wheel,4\n17954-2,Axle,2\n,,\n";

        let parser = TableParser::default();
        let table = parser.parse_bytes("Cart", csv_data, TableFormat::Csv).unwrap();

        assert_eq!(table.name, "Cart");
        assert_eq!(table.column_headers, vec!["pn", "description", "qty"]);
        // the blank line is dropped
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row_number, 2);
        assert_eq!(parser.identifier(&table.rows[0]), Some("17954-1".to_string()));
        assert_eq!(parser.quantity(&table.rows[1]), Some("2".to_string()));
        assert_eq!(table.rows[1].values.get("description"), Some(&"Axle".to_string()));
    }

    #[test]
    fn test_identifier_falls_back_to_later_candidates() {
        let csv_data = b"part_number,quantity\nPN-7,3\n";
        let parser = TableParser::default();
        let table = parser.parse_bytes("Sub", csv_data, TableFormat::Csv).unwrap();

        assert_eq!(parser.identifier(&table.rows[0]), Some("PN-7".to_string()));
        assert_eq!(parser.quantity(&table.rows[0]), Some("3".to_string()));
        assert!(parser.is_quantity_column("quantity"));
        assert!(parser.is_identifier_column("part_number"));
        assert!(!parser.is_identifier_column("description"));
    }

    #[test]
    fn test_custom_columns() {
        let parser = TableParser::new(&["Item".to_string()], &["Count".to_string()]);
        let table = parser
            .parse_bytes("Sub", b"Item,Count\nBolt,12\n", TableFormat::Csv)
            .unwrap();
        assert_eq!(parser.identifier(&table.rows[0]), Some("Bolt".to_string()));
        assert_eq!(parser.quantity(&table.rows[0]), Some("12".to_string()));
    }

    #[test]
    fn test_xml_parsing() {
        let xml = br#"<bom>
            <row><PN>17954-1</PN><QTY>4</QTY><Description>Wheel</Description></row>
            <row><PN>17954-2</PN><QTY>1</QTY></row>
        </bom>"#;

        let parser = TableParser::default();
        let table = parser.parse_bytes("Cart", xml, TableFormat::Xml).unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.column_headers, vec!["pn", "qty", "description"]);
        assert_eq!(parser.identifier(&table.rows[1]), Some("17954-2".to_string()));
        assert_eq!(parser.quantity(&table.rows[0]), Some("4".to_string()));
        assert!(table.parse_warnings.is_empty());
    }

    #[test]
    fn test_invalid_excel_bytes_fail() {
        let parser = TableParser::default();
        assert!(parser.parse_bytes("Cart", b"not a zip", TableFormat::Excel).is_err());
    }

    #[test]
    fn test_excel_first_sheet() {
        let data = include_bytes!("../../tests/fixtures/frame.xlsx");
        let parser = TableParser::default();
        let table = parser.parse_bytes("Frame", data, TableFormat::Excel).unwrap();

        assert_eq!(table.name, "Frame");
        assert_eq!(table.format, TableFormat::Excel);
        assert_eq!(table.column_headers, vec!["pn", "qty"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(parser.identifier(&table.rows[0]), Some("B-1".to_string()));
        assert_eq!(parser.quantity(&table.rows[0]), Some("6".to_string()));
        assert_eq!(table.rows[1].row_number, 3);
    }

    #[test]
    fn test_workbook_sheets_in_order() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cart.xlsx");
        let tables = TableParser::default().parse_workbook(&path).unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Parts list", "Cart", "Frame"]);
        assert_eq!(tables[0].column_headers, vec!["pn", "description", "pkg qty"]);
    }
}
