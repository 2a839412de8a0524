use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::model::PlayRecord;

pub const DEFAULT_RANK_LIMIT: usize = 10;

const MS_PER_HOUR: f64 = 1000.0 * 60.0 * 60.0;

/// Summary numbers over a set of plays
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stats {
    pub total_plays: usize,
    pub unique_tracks: usize,
    pub unique_artists: usize,
    pub total_duration_ms: u64,
    /// Mean over the plays with a popularity above zero
    pub avg_popularity: Option<f64>,
}

impl Stats {
    pub fn from_records(records: &[PlayRecord]) -> Self {
        let unique_tracks: HashSet<&str> = records.iter().map(|r| r.track_name.as_str()).collect();
        let unique_artists: HashSet<&str> = records.iter().map(|r| r.artist_name.as_str()).collect();

        let popular: Vec<i64> = records
            .iter()
            .map(|r| r.popularity)
            .filter(|p| *p > 0)
            .collect();
        let avg_popularity = match popular.is_empty() {
            true => None,
            false => Some(popular.iter().sum::<i64>() as f64 / popular.len() as f64),
        };

        Self {
            total_plays: records.len(),
            unique_tracks: unique_tracks.len(),
            unique_artists: unique_artists.len(),
            total_duration_ms: records.iter().map(|r| r.duration_ms).sum(),
            avg_popularity,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.total_duration_ms as f64 / MS_PER_HOUR
    }

    /// Total listening time with one decimal, e.g. `1.5`
    pub fn total_hours_display(&self) -> String {
        format!("{:.1}", self.total_hours())
    }
}

/// Plays of one distinct track inside the window
#[derive(Debug, Clone, PartialEq)]
pub struct TrackAggregate {
    pub track_name: String,
    pub artist_name: String,
    pub plays: usize,
    /// The first record seen for this track. Records arrive newest first, so this is the most
    /// recent play.
    pub snapshot: PlayRecord,
}

impl TrackAggregate {
    pub fn spotify_url(&self) -> Option<&str> {
        self.snapshot.external_urls.spotify()
    }
}

/// Top `limit` tracks by play count.
///
/// Tracks are keyed on `(track name, artist name)`. Ties keep the order in which each track
/// first appeared.
pub fn rank(records: &[PlayRecord], limit: usize) -> Vec<TrackAggregate> {
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();
    let mut tracks: Vec<TrackAggregate> = Vec::new();

    for record in records {
        match index.get(&record.key()) {
            Some(&i) => tracks[i].plays += 1,
            None => {
                index.insert(record.key(), tracks.len());
                tracks.push(TrackAggregate {
                    track_name: record.track_name.clone(),
                    artist_name: record.artist_name.clone(),
                    plays: 1,
                    snapshot: record.clone(),
                });
            }
        }
    }

    // stable
    tracks.sort_by(|a, b| b.plays.cmp(&a.plays));
    tracks.truncate(limit);
    tracks
}

/// Plays on one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBucket<'a> {
    /// `None` collects the plays without a usable timestamp
    pub date: Option<NaiveDate>,
    pub records: Vec<&'a PlayRecord>,
}

/// Group plays by the date of `played_at`, newest day first and undated plays last
pub fn daily_buckets(records: &[PlayRecord]) -> Vec<DailyBucket<'_>> {
    let mut days: BTreeMap<NaiveDate, Vec<&PlayRecord>> = BTreeMap::new();
    let mut undated = Vec::new();

    for record in records {
        match record.played_at {
            Some(played_at) => days.entry(played_at.date_naive()).or_default().push(record),
            None => undated.push(record),
        }
    }

    let mut buckets: Vec<DailyBucket> = days
        .into_iter()
        .rev()
        .map(|(date, records)| DailyBucket {
            date: Some(date),
            records,
        })
        .collect();

    if !undated.is_empty() {
        buckets.push(DailyBucket {
            date: None,
            records: undated,
        });
    }
    buckets
}

#[cfg(test)]
mod test {
    use chrono::DateTime;

    use super::*;

    fn play(track: &str, artist: &str) -> PlayRecord {
        PlayRecord {
            track_name: track.to_string(),
            artist_name: artist.to_string(),
            ..Default::default()
        }
    }

    fn played(track: &str, at: &str) -> PlayRecord {
        PlayRecord {
            played_at: Some(DateTime::parse_from_rfc3339(at).unwrap()),
            ..play(track, "Artist")
        }
    }

    #[test]
    fn stats_counts_every_play() {
        let records = vec![play("A", "X"), play("A", "X"), play("B", "Y"), play("", "")];
        let stats = Stats::from_records(&records);

        assert_eq!(stats.total_plays, 4);
        assert_eq!(stats.unique_tracks, 3);
        assert_eq!(stats.unique_artists, 3);
    }

    #[test]
    fn missing_names_share_a_key() {
        let records = vec![play("", "X"), play("", "Y"), play("", "X")];
        let stats = Stats::from_records(&records);
        assert_eq!(stats.unique_tracks, 1);
        assert_eq!(stats.unique_artists, 2);

        let ranked = rank(&records, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].plays, 2);
    }

    #[test]
    fn popularity_ignores_unknown_values() {
        let records: Vec<PlayRecord> = [0, 80, 90]
            .into_iter()
            .map(|popularity| PlayRecord {
                popularity,
                ..play("A", "X")
            })
            .collect();
        let stats = Stats::from_records(&records);

        assert_eq!(stats.total_plays, 3);
        assert_eq!(stats.avg_popularity, Some(85.0));
    }

    #[test]
    fn popularity_is_none_without_values() {
        let records = vec![PlayRecord { popularity: -1, ..play("A", "X") }, play("B", "Y")];
        assert_eq!(Stats::from_records(&records).avg_popularity, None);
        assert_eq!(Stats::from_records(&[]), Stats::default());
    }

    #[test]
    fn duration_in_hours() {
        let records = vec![
            PlayRecord { duration_ms: 3_600_000, ..play("A", "X") },
            PlayRecord { duration_ms: 2_160_000, ..play("B", "Y") },
        ];
        assert_eq!(Stats::from_records(&records).total_hours_display(), "1.6");
    }

    #[test]
    fn rank_by_play_count() {
        let records = vec![play("B", "Y"), play("A", "X"), play("A", "X")];
        let ranked = rank(&records, 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!((ranked[0].track_name.as_str(), ranked[0].plays), ("A", 2));
        assert_eq!((ranked[1].track_name.as_str(), ranked[1].plays), ("B", 1));
    }

    #[test]
    fn rank_ties_keep_first_appearance() {
        let records = vec![play("C", "Z"), play("A", "X"), play("B", "Y"), play("A", "X"), play("B", "Y")];
        let names: Vec<_> = rank(&records, 10).into_iter().map(|t| t.track_name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn same_title_by_other_artist_is_another_track() {
        let ranked = rank(&[play("Intro", "X"), play("Intro", "Y")], 10);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn rank_keeps_first_seen_snapshot() {
        let newest = PlayRecord { album_name: "Deluxe".into(), ..play("A", "X") };
        let older = PlayRecord { album_name: "Original".into(), ..play("A", "X") };
        let ranked = rank(&[newest, older], 1);

        assert_eq!(ranked[0].plays, 2);
        assert_eq!(ranked[0].snapshot.album_name, "Deluxe");
    }

    #[test]
    fn buckets_newest_day_first() {
        let records = vec![
            played("late", "2024-05-02T23:59:00+00:00"),
            played("early", "2024-05-01T08:00:00+00:00"),
            play("undated", "Artist"),
            played("morning", "2024-05-02T07:00:00+00:00"),
        ];
        let buckets = daily_buckets(&records);

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2024, 5, 2));
        let names: Vec<_> = buckets[0].records.iter().map(|r| r.track_name.as_str()).collect();
        assert_eq!(names, vec!["late", "morning"]);
        assert_eq!(buckets[1].date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(buckets[2].date, None);
    }

    #[test]
    fn bucket_date_uses_the_stored_offset() {
        let records = vec![played("night", "2024-05-01T23:30:00+09:00")];
        assert_eq!(daily_buckets(&records)[0].date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }
}
