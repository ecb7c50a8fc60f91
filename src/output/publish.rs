use crate::output::record::Record;
use crate::output::traits::{PublishReport, PublishResult, ResultSink};

/// Publishes a session's Records to a sink
///
/// When the JSON array of all Records fits in `max_message_bytes` it goes
/// out as one message. Otherwise the Records are split into chunks of
/// `chunk_size` (the last one may be shorter) and each chunk is sent as its
/// own message. A rejected chunk is logged and the rest are still sent.
///
/// Returns an error only when the Records cannot be serialized at all.
pub async fn publish_records(
    sink: &dyn ResultSink,
    records: &[Record],
    chunk_size: usize,
    max_message_bytes: usize,
) -> PublishResult<PublishReport> {
    let mut report = PublishReport::default();
    if records.is_empty() {
        return Ok(report);
    }

    let whole = serde_json::to_string(records)?;
    let messages = if whole.len() <= max_message_bytes {
        vec![whole]
    } else {
        records
            .chunks(chunk_size.max(1))
            .map(|chunk| serde_json::to_string(chunk))
            .collect::<Result<Vec<_>, _>>()?
    };

    let total = messages.len();
    for (index, message) in messages.iter().enumerate() {
        match sink.send(message).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                tracing::error!("publish: chunk {}/{} failed: {}", index + 1, total, e);
                report.failed += 1;
            }
        }
    }

    tracing::debug!(
        "publish: {} records in {} messages ({} failed)",
        records.len(),
        total,
        report.failed
    );
    Ok(report)
}
