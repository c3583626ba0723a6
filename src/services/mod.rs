pub mod resolver;

pub use resolver::{CreateLinkRequest, LinkResolver};
