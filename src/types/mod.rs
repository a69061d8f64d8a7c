mod encoding;
mod header;
mod session;

pub use encoding::{Encoding, Predictor};
pub use header::{FieldDefinition, FrameFieldList, LogHeader};
pub use session::{FlightData, ParseResult, Progress, Session, TimeSeries};
