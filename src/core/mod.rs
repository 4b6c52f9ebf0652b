pub mod etl;
pub mod extract;
pub mod labels;
pub mod normalize;
pub mod page;
pub mod pipeline;
pub mod rows;

pub use crate::domain::model::{Label, LabelBatch, LabelOutcome, Order};
pub use crate::domain::ports::{ConfigProvider, OrderSource, PageFetcher, Pipeline, Storage};
pub use crate::utils::error::Result;
