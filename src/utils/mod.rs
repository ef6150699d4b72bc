mod command_to_string;
mod detect_software;
mod expand_and_resolve_path;
mod utils;

pub use command_to_string::command_to_string;
pub use command_to_string::shell_quote;

pub use detect_software::check_tool;

pub use expand_and_resolve_path::expand_and_resolve_path;
pub use expand_and_resolve_path::to_absolute_path;

pub use utils::file_stem_no_gz;
pub use utils::resolve_threads;
