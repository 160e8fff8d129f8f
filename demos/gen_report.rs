//! Generate an assessment report for validation testing

use chrono::Duration;
use kinemetry::schema::FrameLogAdapter;
use kinemetry::tapping::{self, TapConfig};
use kinemetry::{AnalysisError, ReportEncoder, DEFAULT_AGGREGATION_WINDOW_MS};

const FRAME_LOG: &str = r#"
{"schema":"motion.frame.v1","timestamp":0,"source":{"detector":"handpose"},"landmarks":[{"name":"thumb_tip","x":200.0,"y":300.0,"confidence":0.95},{"name":"index_finger_tip","x":245.0,"y":300.0,"confidence":0.95}]}
{"schema":"motion.frame.v1","timestamp":100,"landmarks":[{"name":"thumb_tip","x":200.0,"y":300.0,"confidence":0.95},{"name":"index_finger_tip","x":220.0,"y":300.0,"confidence":0.95}]}
{"schema":"motion.frame.v1","timestamp":200,"landmarks":[{"name":"thumb_tip","x":200.0,"y":300.0,"confidence":0.95},{"name":"index_finger_tip","x":245.0,"y":300.0,"confidence":0.95}]}
{"schema":"motion.frame.v1","timestamp":300,"landmarks":[{"name":"thumb_tip","x":200.0,"y":300.0,"confidence":0.95},{"name":"index_finger_tip","x":220.0,"y":300.0,"confidence":0.95}]}
{"schema":"motion.frame.v1","timestamp":400,"landmarks":[{"name":"thumb_tip","x":200.0,"y":300.0,"confidence":0.95},{"name":"index_finger_tip","x":245.0,"y":300.0,"confidence":0.95}]}
{"schema":"motion.frame.v1","timestamp":500,"landmarks":[{"name":"thumb_tip","x":200.0,"y":300.0,"confidence":0.95},{"name":"index_finger_tip","x":220.0,"y":300.0,"confidence":0.95}]}
{"schema":"motion.frame.v1","timestamp":600,"landmarks":[{"name":"thumb_tip","x":200.0,"y":300.0,"confidence":0.95},{"name":"index_finger_tip","x":245.0,"y":300.0,"confidence":0.95}]}
{"schema":"motion.frame.v1","timestamp":700,"landmarks":[{"name":"thumb_tip","x":200.0,"y":300.0,"confidence":0.95},{"name":"index_finger_tip","x":220.0,"y":300.0,"confidence":0.95}]}
{"schema":"motion.frame.v1","timestamp":800,"landmarks":[{"name":"thumb_tip","x":200.0,"y":300.0,"confidence":0.95},{"name":"index_finger_tip","x":245.0,"y":300.0,"confidence":0.95}]}
"#;

fn main() {
    match generate_report() {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}

fn generate_report() -> Result<String, AnalysisError> {
    let frames = FrameLogAdapter::parse_ndjson(FRAME_LOG)?;
    let observations = FrameLogAdapter::to_observations(&frames)?;

    let analysis = tapping::analyze_recording(
        observations,
        TapConfig::default(),
        Duration::milliseconds(DEFAULT_AGGREGATION_WINDOW_MS),
    )?;

    let report = ReportEncoder::new().encode_tapping(&analysis.summary, &analysis.aggregate, None);
    report.to_json()
}
