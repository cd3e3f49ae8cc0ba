use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::scene::Scene;

/// Load scenes from a `.json` file, a `.jsonl` file, or a directory of them.
///
/// A `.json` file may hold `{"corpus": [...]}`, a bare array of scenes, or a
/// single scene object. Directories are walked recursively in path order.
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<Scene>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter() {
            let entry = entry?;
            let p = entry.path();
            if p.is_file() && matches!(extension(p), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else {
        files.push(path.to_path_buf());
    }

    let mut scenes = Vec::new();
    for file in files {
        if extension(&file) == Some("jsonl") {
            scenes.extend(read_jsonl(&file)?);
        } else {
            scenes.extend(read_json(&file)?);
        }
    }
    tracing::info!(path = %path.display(), num_scenes = scenes.len(), "loaded corpus");
    Ok(scenes)
}

fn extension(p: &Path) -> Option<&str> {
    p.extension().and_then(|s| s.to_str())
}

fn read_jsonl(file: &Path) -> Result<Vec<Scene>> {
    let reader = BufReader::new(File::open(file)?);
    let mut scenes = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        scenes.push(serde_json::from_str(&line)?);
    }
    Ok(scenes)
}

fn read_json(file: &Path) -> Result<Vec<Scene>> {
    let reader = BufReader::new(File::open(file)?);
    let json: Value = serde_json::from_reader(reader)?;
    scenes_from_value(json)
}

/// Interpret an already-parsed JSON document as a list of scenes.
pub fn scenes_from_value(json: Value) -> Result<Vec<Scene>> {
    match json {
        Value::Object(mut obj) => match obj.remove("corpus") {
            Some(Value::Array(arr)) => scenes_from_array(arr),
            Some(_) => Err(Error::Corpus("`corpus` is not an array".into())),
            None => Ok(vec![serde_json::from_value(Value::Object(obj))?]),
        },
        Value::Array(arr) => scenes_from_array(arr),
        _ => Err(Error::Corpus("expected an object or an array at top level".into())),
    }
}

fn scenes_from_array(arr: Vec<Value>) -> Result<Vec<Scene>> {
    let mut scenes = Vec::with_capacity(arr.len());
    for v in arr {
        scenes.push(serde_json::from_value(v)?);
    }
    Ok(scenes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn corpus_object() {
        let scenes = scenes_from_value(json!({
            "corpus": [
                {"playId": "p", "sceneId": "p:1", "sceneNum": 1, "text": "a b"},
                {"playId": "p", "sceneId": "p:2", "sceneNum": 2, "text": "c"}
            ]
        }))
        .unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[1].scene_id, "p:2");
    }

    #[test]
    fn single_scene_object() {
        let scenes = scenes_from_value(json!({"sceneId": "s", "text": "t"})).unwrap();
        assert_eq!(scenes.len(), 1);
    }

    #[test]
    fn rejects_non_array_corpus() {
        let err = scenes_from_value(json!({"corpus": 3})).unwrap_err();
        assert!(matches!(err, Error::Corpus(_)));
        assert!(matches!(scenes_from_value(json!("x")), Err(Error::Corpus(_))));
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = load_corpus(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn walk_error_keeps_its_source() {
        let err: Error = WalkDir::new("/definitely/not/here")
            .into_iter()
            .next()
            .unwrap()
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Walk(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn non_string_text_is_a_json_error() {
        let err = scenes_from_value(json!([{"sceneId": "s", "text": 5}])).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn loads_directory_of_json_and_jsonl() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"{"corpus":[{"sceneId":"a","text":"one"}]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("b.jsonl"),
            "{\"sceneId\":\"b\",\"text\":\"two\"}\n\n{\"sceneId\":\"c\",\"text\":\"three\"}\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let scenes = load_corpus(dir.path()).unwrap();
        let ids: Vec<_> = scenes.iter().map(|s| s.scene_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
