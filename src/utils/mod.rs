pub mod clock;
pub mod codegen;
pub mod url_validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codegen::{CodeGenerator, RandomCodeGenerator, generate_random_code, validate_alias};
pub use url_validator::validate_url;
