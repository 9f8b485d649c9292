pub mod etl;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod transform;

pub use crate::domain::model::{Column, ColumnType, LoadOutcome, Record, RecordBatch};
pub use crate::domain::ports::{ConfigProvider, Pipeline};
pub use crate::utils::error::Result;
