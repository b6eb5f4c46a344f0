mod directives;
mod scan;

pub use directives::cmd_directives;
pub use scan::cmd_scan;
