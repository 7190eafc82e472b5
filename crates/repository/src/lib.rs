//! Result repositories (§4.9): pluggable sinks for run results and
//! summaries — JSON, JUnit XML, HTML — composed behind a single
//! fan-out [`CompositeRepository`] with partial-failure aggregation.

pub mod composite;
pub mod html;
pub mod json;
pub mod junit;
pub mod repository;
pub mod summary;

pub use composite::CompositeRepository;
pub use html::HtmlRepository;
pub use json::JsonRepository;
pub use junit::JunitRepository;
pub use repository::Repository;
pub use summary::build_summary;
