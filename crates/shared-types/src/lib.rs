pub mod props;
pub mod result;
pub mod spec;

pub use props::{
    DetailedAnalysis, ExtractedProperties, FontInfo, ImageStats, Margins, PageGeometry,
    PageNumberPosition, PageSize, SectionGeometry,
};
pub use result::{ReportOptions, ValidationResult};
pub use spec::{Services, Specification, DEFAULT_MARGIN_CM};
