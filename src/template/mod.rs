pub mod parser;

pub use parser::{
    parse_template_references, reference_at_offset, TemplateObject, TemplateReference,
};
