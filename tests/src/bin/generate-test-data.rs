use anyhow::Context;
use chrono::{Duration, Utc};
use rand::Rng;
use threadline_api::{CommentId, RawRecord, Timestamp};

const NUM_COMMENTS: usize = 200;
const TOP_LEVEL_RATIO: f64 = 0.25;
const PENDING_RATIO: f64 = 0.02;
const MAX_WORDS: usize = 40;
const MAX_SPACING_SECS: i64 = 600;

fn gen_comment_text(rng: &mut impl Rng) -> String {
    lipsum::lipsum_words(rng.gen_range(1..=MAX_WORDS))
}

fn main() -> anyhow::Result<()> {
    let num_comments = match std::env::args().nth(1) {
        None => NUM_COMMENTS,
        Some(n) => n
            .parse()
            .with_context(|| format!("parsing comment count {n:?}"))?,
    };

    let mut rng = rand::thread_rng();
    let mut date = Utc::now() - Duration::days(7);
    let mut records: Vec<RawRecord> = Vec::with_capacity(num_comments);
    for _ in 0..num_comments {
        date = date + Duration::seconds(rng.gen_range(0..MAX_SPACING_SECS));
        // replies only ever point to earlier comments, so the forest has no cycle
        let parent_id = match records.is_empty() || rng.gen_bool(TOP_LEVEL_RATIO) {
            true => None,
            false => Some(records[rng.gen_range(0..records.len())].id.clone()),
        };
        let created_at = match rng.gen_bool(PENDING_RATIO) {
            true => Timestamp::Pending,
            false => Timestamp::Committed(date),
        };
        records.push(RawRecord {
            id: CommentId(uuid::Uuid::new_v4().to_string()),
            text: Some(gen_comment_text(&mut rng)),
            created_at,
            parent_id,
        });
    }

    let json = serde_json::to_string_pretty(&records).context("serializing comments")?;
    println!("{json}");
    Ok(())
}
