mod render;

pub use render::{RenderTask, ToastRenderer, TracingRenderer};
