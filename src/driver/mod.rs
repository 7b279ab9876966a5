pub mod console;
pub mod quads;
pub mod render_loop;
