mod ask;
mod config_gen;
mod render;

pub use ask::ask;
pub use config_gen::config_generate;
pub use render::render_file;
