//! Report Module
//!
//! Everything between raw documents and the HTML the display layer shows:
//!
//! - [`document`]: extracted documents and the excerpt sent to the model
//! - [`prompt`]: consultant and chat prompts
//! - [`parsing`]: tagged-section scraping of the model answer
//! - [`annotate`]: HTML annotation of the cleaned prose

pub mod annotate;
pub mod document;
pub mod parsing;
pub mod prompt;

pub use annotate::{annotate_prose, render_report};
pub use document::{Document, DocumentKind};
pub use parsing::{parse_report, ParsedReport};
pub use prompt::{AnalysisLevel, AnalysisOptions, Industry};
