use anyhow::{Context, Result};
use scenes_core::{InvertedIndex, Scene};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;

/// Which scene field a query job writes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    SceneId,
    PlayId,
}

impl Field {
    fn of(self, scene: &Scene) -> &str {
        match self {
            Field::SceneId => &scene.scene_id,
            Field::PlayId => &scene.play_id,
        }
    }
}

fn default_field() -> Field { Field::SceneId }

/// A list of queries whose hits go, sorted, into one output file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryJob {
    pub output: String,
    pub queries: Vec<String>,
    #[serde(default)]
    pub phrase: bool,
    #[serde(default = "default_field")]
    pub field: Field,
    /// Collapse repeated values (e.g. the same scene hit by two queries).
    #[serde(default)]
    pub dedup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPlan {
    pub jobs: Vec<QueryJob>,
}

impl Default for ReportPlan {
    fn default() -> Self {
        let job = |output: &str, queries: &[&str], field: Field, dedup: bool| QueryJob {
            output: output.to_string(),
            queries: queries.iter().map(|q| q.to_string()).collect(),
            phrase: true,
            field,
            dedup,
        };
        Self {
            jobs: vec![
                job("terms1.txt", &["verona", "rome", "italy"], Field::SceneId, true),
                job("terms2.txt", &["falstaff"], Field::PlayId, false),
                job("terms3.txt", &["soldier"], Field::PlayId, false),
                job("phrase0.txt", &["lady macbeth"], Field::SceneId, false),
                job("phrase1.txt", &["a rose by any other name"], Field::SceneId, false),
                job("phrase2.txt", &["cry havoc"], Field::SceneId, false),
            ],
        }
    }
}

impl ReportPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("opening plan {}", path.display()))?;
        let plan = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parsing plan {}", path.display()))?;
        Ok(plan)
    }
}

#[derive(Debug, Serialize)]
pub struct MetaFile {
    pub num_scenes: usize,
    pub num_terms: usize,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub num_scenes: usize,
    pub num_terms: usize,
    /// (scene id, length in characters) of the first shortest scene
    pub shortest: Option<(String, usize)>,
    pub average_len: f64,
}

/// Non-overlapping occurrences of `needle` anywhere in `text`, word
/// boundaries ignored ("thou" counts inside "thought").
pub fn count_occurrences(text: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    text.matches(needle).count()
}

fn pronoun_counts(scene: &Scene) -> (usize, usize, usize) {
    let text = scene.text.as_deref().unwrap_or_default();
    (
        count_occurrences(text, "thee"),
        count_occurrences(text, "thou"),
        count_occurrences(text, "you"),
    )
}

pub fn collection_stats(index: &InvertedIndex<Scene>) -> CollectionStats {
    let mut shortest: Option<(String, usize)> = None;
    let mut total = 0usize;
    for scene in index.documents() {
        let len = scene.char_len();
        total += len;
        if shortest.as_ref().map_or(true, |(_, best)| len < *best) {
            shortest = Some((scene.scene_id.clone(), len));
        }
    }
    let average_len = if index.is_empty() { 0.0 } else { total as f64 / index.len() as f64 };
    CollectionStats { num_scenes: index.len(), num_terms: index.num_terms(), shortest, average_len }
}

/// Sorted ids of scenes using "thee" or "thou" more often than "you".
pub fn archaic_scenes(index: &InvertedIndex<Scene>) -> Vec<String> {
    let mut ids: Vec<String> = index
        .documents()
        .filter(|scene| {
            let (thee, thou, you) = pronoun_counts(scene);
            thee > you || thou > you
        })
        .map(|scene| scene.scene_id.clone())
        .collect();
    ids.sort();
    ids
}

/// `sceneNum,thee,you` rows, one per scene in collection order.
pub fn pronoun_rows(index: &InvertedIndex<Scene>) -> Vec<String> {
    index
        .documents()
        .map(|scene| {
            let (thee, _, you) = pronoun_counts(scene);
            format!("{},{},{}", scene.scene_num, thee, you)
        })
        .collect()
}

pub fn run_job(index: &InvertedIndex<Scene>, job: &QueryJob) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for q in &job.queries {
        let hits = index.query(q, job.phrase);
        tracing::info!(query = %q, phrase = job.phrase, hits = hits.len(), "ran report query");
        out.extend(hits.into_iter().map(|scene| job.field.of(scene).to_string()));
    }
    out.sort();
    if job.dedup {
        out.dedup();
    }
    out
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    for line in lines {
        writeln!(f, "{line}")?;
    }
    Ok(())
}

/// Write every report file into `out_dir` and return the collection stats.
pub fn write_reports(index: &InvertedIndex<Scene>, plan: &ReportPlan, out_dir: &Path) -> Result<CollectionStats> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    write_lines(&out_dir.join("terms0"), &archaic_scenes(index))?;
    write_lines(&out_dir.join("data.csv"), &pronoun_rows(index))?;

    let stats = collection_stats(index);
    if let Some((scene_id, len)) = &stats.shortest {
        tracing::info!(scene_id = %scene_id, len, "shortest scene");
    }
    tracing::info!(average_len = stats.average_len, "average scene length");

    for job in &plan.jobs {
        write_lines(&out_dir.join(&job.output), &run_job(index, job))?;
    }

    let meta = MetaFile {
        num_scenes: stats.num_scenes,
        num_terms: stats.num_terms,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: 1,
    };
    fs::write(out_dir.join("meta.json"), serde_json::to_string_pretty(&meta)?)?;

    tracing::info!(output = %out_dir.display(), jobs = plan.jobs.len(), "reports written");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn index() -> InvertedIndex<Scene> {
        let mut index = InvertedIndex::new();
        index
            .build(vec![
                Scene::new("romeo", "romeo:1.1", 0, "in fair verona where we lay our scene"),
                Scene::new("macbeth", "macbeth:1.5", 1, "enter lady macbeth thou thee thee you"),
                Scene::new("macbeth", "macbeth:2.1", 2, "lady of rome you you"),
                Scene::new("caesar", "caesar:3.1", 3, "cry havoc"),
            ])
            .unwrap();
        index
    }

    #[test]
    fn counts_substrings() {
        assert_eq!(count_occurrences("thou thought thou", "thou"), 3);
        assert_eq!(count_occurrences("you", ""), 0);
        assert_eq!(count_occurrences("aaaa", "aa"), 2);
    }

    #[test]
    fn stats_pick_first_shortest() {
        let stats = collection_stats(&index());
        assert_eq!(stats.num_scenes, 4);
        assert_eq!(stats.shortest, Some(("caesar:3.1".to_string(), 9)));
        let total = 37 + 37 + 20 + 9;
        assert!((stats.average_len - total as f64 / 4.0).abs() < 1e-9);
    }

    #[test]
    fn archaic_and_rows() {
        let index = index();
        assert_eq!(archaic_scenes(&index), vec!["macbeth:1.5".to_string()]);
        assert_eq!(pronoun_rows(&index), vec!["0,0,0", "1,2,1", "2,0,2", "3,0,0"]);
    }

    #[test]
    fn jobs_sort_and_dedup() {
        let index = index();
        let union = QueryJob {
            output: "x".into(),
            queries: vec!["verona".into(), "rome".into(), "rome".into()],
            phrase: true,
            field: Field::SceneId,
            dedup: true,
        };
        assert_eq!(run_job(&index, &union), vec!["macbeth:2.1", "romeo:1.1"]);

        let plays = QueryJob { queries: vec!["lady".into()], field: Field::PlayId, dedup: false, ..union };
        assert_eq!(run_job(&index, &plays), vec!["macbeth", "macbeth"]);
    }

    #[test]
    fn plan_json_uses_defaults() {
        let plan: ReportPlan = serde_json::from_str(r#"{"jobs":[{"output":"o.txt","queries":["cry havoc"]}]}"#).unwrap();
        assert_eq!(plan.jobs[0].field, Field::SceneId);
        assert!(!plan.jobs[0].phrase);
        assert!(!plan.jobs[0].dedup);
    }

    #[test]
    fn writes_report_files() {
        let dir = tempdir().unwrap();
        let stats = write_reports(&index(), &ReportPlan::default(), dir.path()).unwrap();
        assert_eq!(stats.num_scenes, 4);

        let read = |name: &str| fs::read_to_string(dir.path().join(name)).unwrap();
        assert_eq!(read("terms0"), "macbeth:1.5\n");
        assert_eq!(read("terms1.txt"), "macbeth:2.1\nromeo:1.1\n");
        assert_eq!(read("phrase0.txt"), "macbeth:1.5\n");
        assert_eq!(read("phrase2.txt"), "caesar:3.1\n");
        assert_eq!(read("phrase1.txt"), "");
        let meta: serde_json::Value = serde_json::from_str(&read("meta.json")).unwrap();
        assert_eq!(meta["num_scenes"], 4);
    }
}
