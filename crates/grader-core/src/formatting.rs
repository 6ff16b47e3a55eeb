use crate::models::GradeReport;

/// Render a grade report as a JSON object with two-space indentation.
///
/// Keys are the sensor names, ordered by name; values are the branding
/// labels. A report without sensors renders as `{}`.
///
/// # Examples
///
/// ```
/// use grader_core::formatting::format_report;
/// use grader_core::models::{Branding, GradeReport};
///
/// assert_eq!(format_report(&GradeReport::new()).unwrap(), "{}");
///
/// let mut report = GradeReport::new();
/// report.insert("temp-1", Branding::UltraPrecise);
/// assert_eq!(
///     format_report(&report).unwrap(),
///     "{\n  \"temp-1\": \"ultra precise\"\n}"
/// );
/// ```
pub fn format_report(report: &GradeReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
