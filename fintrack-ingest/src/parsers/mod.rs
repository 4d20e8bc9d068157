pub mod csv;
pub mod ofx;
pub mod pdf_text;

pub use csv::parse_csv;
pub use ofx::parse_ofx;
pub use pdf_text::parse_pdf_text;
