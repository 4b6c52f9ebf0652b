pub use crate::app::pipelines::label_pipeline::LabelPipeline;
