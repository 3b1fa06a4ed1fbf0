pub mod classify;
pub mod generate;
pub mod params;
pub mod parser;
pub mod rewrite;
pub mod task;

pub use classify::ElementPresenceMap;
pub use generate::Boilerplate;
pub use params::ParameterRegistry;
pub use parser::{parse_document, DocTag, ParsedDocument, TemplateCommand};
pub use rewrite::{render_header, RegistryImport, Rewriter, TemplateDocument};
pub use task::{generate_documents, run_soy, SoyReport};
