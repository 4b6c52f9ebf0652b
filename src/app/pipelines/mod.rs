pub mod label_pipeline;
