use colored::Colorize;
use scanmatch_core::{LookupOutcome, ProductRecord};
use scanmatch_storage::{Catalog, CatalogState};
use serde_json::Value;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Status line shown above the result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub level: StatusLevel,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: StatusLevel::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: StatusLevel::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: StatusLevel::Error,
        }
    }

    /// Empty status, replaces any earlier message
    pub fn clear() -> Self {
        Self::info("")
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    pub fn invalid_input() -> Self {
        Self::error("Enter or scan a valid code.")
    }

    pub fn not_found(attempted: &str) -> Self {
        Self::error(format!(
            "Code {} was not found in the product table.",
            attempted
        ))
    }

    pub fn for_catalog(catalog: &Catalog) -> Self {
        match catalog.state() {
            CatalogState::Loaded { .. } => Self::success(catalog.describe()),
            CatalogState::Unavailable { .. } => Self::error(catalog.describe()),
        }
    }
}

/// Renders lookup outcomes
pub trait Presenter {
    fn status(&mut self, status: Status) -> io::Result<()>;

    fn show(&mut self, record: &ProductRecord) -> io::Result<()>;

    fn hide(&mut self) -> io::Result<()>;

    fn present(&mut self, outcome: &LookupOutcome<'_>) -> io::Result<()> {
        match outcome {
            LookupOutcome::Invalid => {
                self.status(Status::invalid_input())?;
                self.hide()
            }
            LookupOutcome::NotFound { attempted } => {
                self.status(Status::not_found(attempted))?;
                self.hide()
            }
            LookupOutcome::Found(record) => {
                self.status(Status::clear())?;
                self.show(record)
            }
        }
    }
}

/// Writes the token and status lines to a terminal (or any writer)
pub struct TerminalPresenter<W: Write> {
    out: W,
    detailed: bool,
    last_status: Status,
    showing: Option<String>,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            detailed: false,
            last_status: Status::clear(),
            showing: None,
        }
    }

    /// Also print the record's descriptive fields under the token
    #[must_use]
    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    pub fn last_status(&self) -> &Status {
        &self.last_status
    }

    /// Barcode of the record currently on display
    pub fn showing(&self) -> Option<&str> {
        self.showing.as_deref()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_field(&mut self, label: &str, value: &str) -> io::Result<()> {
        writeln!(self.out, "  {:<9} {}", format!("{}:", label).dimmed(), value)
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn status(&mut self, status: Status) -> io::Result<()> {
        if !status.is_empty() {
            let line = match status.level {
                StatusLevel::Info => status.message.normal(),
                StatusLevel::Success => status.message.green(),
                StatusLevel::Error => status.message.red().bold(),
            };
            writeln!(self.out, "{}", line)?;
        }
        self.last_status = status;
        self.out.flush()
    }

    fn show(&mut self, record: &ProductRecord) -> io::Result<()> {
        let style = record.token_style();
        let (fr, fg, fb) = style.foreground();
        let (br, bg, bb) = style.background();
        let token = format!("  {}  ", record.display_value)
            .bold()
            .truecolor(fr, fg, fb)
            .on_truecolor(br, bg, bb);
        writeln!(self.out, "{}", token)?;

        if self.detailed {
            self.write_field("Code", &record.barcode)?;
            if let Some(name) = &record.name {
                self.write_field("Name", name)?;
            }
            if let Some(category) = &record.category {
                self.write_field("Category", category)?;
            }
            if let Some(price) = &record.price {
                self.write_field("Price", &plain_value(price))?;
            }
            if let Some(stock) = &record.stock {
                self.write_field("Stock", &plain_value(stock))?;
            }
        }

        self.showing = Some(record.barcode.clone());
        self.out.flush()
    }

    fn hide(&mut self) -> io::Result<()> {
        self.showing = None;
        Ok(())
    }
}

/// JSON strings without their quotes, everything else as JSON
fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanmatch_core::{Lookup, ProductTable};
    use serde_json::json;

    fn table() -> ProductTable {
        ProductTable::new(vec![ProductRecord::new("7501234567890", "42", "Amarillo")
            .with_name("Tornillo")
            .with_price(json!(1.5))
            .with_stock(json!("12"))])
    }

    fn output(presenter: TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn test_found_clears_status_and_shows_token() {
        let table = table();
        let lookup = Lookup::new(&table);
        let mut presenter = TerminalPresenter::new(Vec::new());

        presenter.present(&lookup.resolve("nope")).unwrap();
        assert_eq!(presenter.last_status().level, StatusLevel::Error);

        presenter.present(&lookup.resolve("7501234567890")).unwrap();
        assert!(presenter.last_status().is_empty());
        assert_eq!(presenter.showing(), Some("7501234567890"));
        assert!(output(presenter).contains("42"));
    }

    #[test]
    fn test_not_found_names_the_code() {
        let table = table();
        let mut presenter = TerminalPresenter::new(Vec::new());

        presenter.present(&Lookup::new(&table).resolve(" 123 ")).unwrap();
        assert_eq!(presenter.last_status(), &Status::not_found("123"));
        assert_eq!(presenter.showing(), None);
        assert!(output(presenter).contains("Code 123 was not found"));
    }

    #[test]
    fn test_invalid_hides_previous_result() {
        let table = table();
        let lookup = Lookup::new(&table);
        let mut presenter = TerminalPresenter::new(Vec::new());

        presenter.present(&lookup.resolve("7501234567890")).unwrap();
        presenter.present(&lookup.resolve("   ")).unwrap();

        assert_eq!(presenter.showing(), None);
        assert_eq!(presenter.last_status(), &Status::invalid_input());
    }

    #[test]
    fn test_detailed_output_lists_fields() {
        let table = table();
        let mut presenter = TerminalPresenter::new(Vec::new()).detailed(true);

        presenter.show(&table.records()[0]).unwrap();
        let text = output(presenter);
        assert!(text.contains("Tornillo"));
        assert!(text.contains("1.5"));
        assert!(text.contains("12"));
        assert!(!text.contains("\"12\""));
        assert!(!text.contains("Category"));
    }

    #[test]
    fn test_catalog_status() {
        let status = Status::for_catalog(&Catalog::unavailable("db.json does not exist"));
        assert_eq!(status.level, StatusLevel::Error);
        assert!(status.message.contains("db.json does not exist"));

        let status = Status::for_catalog(&Catalog::from_table(table()));
        assert_eq!(status, Status::success("Product table loaded (1 records)."));
    }
}
