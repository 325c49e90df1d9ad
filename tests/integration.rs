use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use geo::Coord;
use signmap::{
    CompanionPaths, Detection, Error, ErrorPolicy, FrameInput, FrameTracker, ProminentSign,
    ScriptKind, SignMapBuilder, TextFrame, TextInfo, TextReader, DEFAULT_REPORT_NAME,
};

const QUAD: &str = "10.2,20,110,20,110,60.7,10,60\n";

/// Lays out `root/images/<name>.png` with its `root/text/<name>_{dete,mean}.txt`.
fn write_frame(root: &Path, name: &str, quads: usize, mean: &str) -> PathBuf {
    let images = root.join("images");
    let text = root.join("text");
    fs::create_dir_all(&images).expect("Failed to create image dir");
    fs::create_dir_all(&text).expect("Failed to create text dir");

    let image = images.join(format!("{name}.png"));
    fs::write(&image, b"").expect("Failed to write image");
    fs::write(text.join(format!("{name}_dete.txt")), QUAD.repeat(quads))
        .expect("Failed to write detections");
    fs::write(text.join(format!("{name}_mean.txt")), mean).expect("Failed to write words");
    image
}

#[test]
fn repeated_sightings_collapse_into_one_sign() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let signs = SignMapBuilder::new().build();
    let inputs = [
        ("0001", 1.0, "EXIT,0.9\n"),
        ("0002", 2.0, "EXIT,0.95\n"),
        ("0003", 3.0, "EX1T,0.7\n"),
    ];
    for (name, timestamp, mean) in inputs {
        let image = write_frame(dir.path(), name, 1, mean);
        let frame = signs
            .ingest_image(&image, timestamp)
            .expect("Failed to ingest")
            .expect("Frame was skipped");
        assert_eq!(frame.detections().len(), 1);
    }
    assert_eq!(signs.frame_count(), 3);

    let registry = signs.finish();
    assert_eq!(registry.signs.len(), 1);
    let sign = &registry.signs[0];
    assert_eq!(sign.canonical(), "EXIT");
    assert_eq!(sign.frames().len(), 3);
    assert_eq!(sign.best_sighting().map(|it| it.name()), Some("2.000000"));

    let detection = sign.frames()[0].detections()[0];
    assert_eq!(detection.points()[0].x, 10.0);
    assert_eq!(detection.points()[2].y, 61.0);

    let report = dir.path().join(DEFAULT_REPORT_NAME);
    registry.write_report(&report).expect("Failed to write report");
    let report = fs::read_to_string(report).expect("Failed to read report");
    assert!(report.starts_with("Canonical Word: EXIT\nDetections:\n"));
    assert!(report.contains("  Frame Name: 1.000000, Score: 0.9\n"));
    assert!(report.contains("  Frame Name: 2.000000, Score: 0.95\n"));
    assert!(report.contains("  Frame Name: 3.000000, Score: 0.7\n"));
    assert!(report.trim_end().ends_with("----------"));
}

#[test]
fn count_mismatch_rejects_the_frame() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mean = "EXIT,0.9\n".repeat(8);
    let image = write_frame(dir.path(), "0001", 9, &mean);

    let strict = SignMapBuilder::new()
        .frame_policy(ErrorPolicy::Abort)
        .build();
    match strict.ingest_image(&image, 1.0) {
        Err(Error::Consistency {
            detections, texts, ..
        }) => {
            assert_eq!(detections, 9);
            assert_eq!(texts, 8);
        }
        other => panic!("expected a consistency error, got {other:?}"),
    }
    assert_eq!(strict.frame_count(), 0);
}

#[test]
fn skipped_frames_leave_earlier_state_alone() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let good = write_frame(dir.path(), "0001", 2, "EXIT,0.9\n出口,0.8\n");
    let bad = write_frame(dir.path(), "0002", 9, &"STOP,0.9\n".repeat(8));
    let missing = dir.path().join("images").join("0003.png");

    let signs = SignMapBuilder::new().frame_policy(ErrorPolicy::Skip).build();
    assert!(signs.ingest_image(&good, 1.0).unwrap().is_some());
    assert!(signs.ingest_image(&bad, 2.0).unwrap().is_none());
    assert!(signs.ingest_image(&missing, 3.0).unwrap().is_none());

    let registry = signs.finish();
    assert_eq!(registry.frames.len(), 1);
    let words = registry
        .signs
        .iter()
        .map(|sign| sign.canonical())
        .collect::<Vec<_>>();
    assert_eq!(words, vec!["EXIT", "出口"]);
}

#[test]
fn custom_path_mapper_replaces_directory_swap() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let root = dir.path().to_path_buf();
    fs::write(root.join("boxes.csv"), QUAD).unwrap();
    fs::write(root.join("words.csv"), "STOP,0.5\n").unwrap();

    let signs = SignMapBuilder::new()
        .round_coordinates(false)
        .path_mapper(move |_: &Path| -> signmap::Result<CompanionPaths> {
            Ok(CompanionPaths {
                detections: root.join("boxes.csv"),
                texts: root.join("words.csv"),
            })
        })
        .build();
    let frame = signs
        .ingest_image(Path::new("anywhere/frame.jpg"), 0.5)
        .unwrap()
        .unwrap();
    assert_eq!(frame.name(), "0.500000");
    assert_eq!(frame.texts()[0].word, "STOP");
    assert_eq!(frame.detections()[0].points()[0].x, 10.2);
}

#[derive(Default)]
struct RecordingTracker {
    calls: Vec<(usize, usize, usize)>,
}

impl FrameTracker for RecordingTracker {
    fn track(
        &mut self,
        input: FrameInput<'_>,
        frames: &[Arc<TextFrame>],
        signs: &[ProminentSign],
    ) {
        self.calls.push((input.index, frames.len(), signs.len()));
    }
}

#[test]
fn tracker_sees_accumulated_state() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let signs = SignMapBuilder::new().max_edit_distance(0).build();
    let mut tracker = RecordingTracker::default();

    for (index, mean) in ["EXIT,0.9\n", "EX1T,0.9\n"].into_iter().enumerate() {
        let image = write_frame(dir.path(), &format!("{index:04}"), 1, mean);
        signs.ingest_image(&image, index as f64).unwrap();
        signs.track(
            &mut tracker,
            FrameInput {
                index,
                timestamp: index as f64,
                image_path: &image,
            },
        );
    }
    assert_eq!(tracker.calls, vec![(0, 1, 1), (1, 2, 2)]);
}

/// Checks that every logged frame is already filed under a sign.
#[derive(Default)]
struct ConsistencyTracker {
    calls: usize,
}

impl FrameTracker for ConsistencyTracker {
    fn track(
        &mut self,
        _input: FrameInput<'_>,
        frames: &[Arc<TextFrame>],
        signs: &[ProminentSign],
    ) {
        let sightings = signs.iter().map(|sign| sign.frames().len()).sum::<usize>();
        assert_eq!(sightings, frames.len());
        self.calls += 1;
    }
}

#[test]
fn tracker_never_sees_a_half_ingested_frame() {
    let signs = SignMapBuilder::new().build();
    let words = ["EXIT", "STOP", "PUSH", "PULL"];
    let image = Path::new("images/0000.png");

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for index in 0..400 {
                let word = words[index % words.len()];
                let frame = TextFrame::new(
                    TextFrame::name_for_timestamp(index as f64),
                    vec![Detection::new([Coord::zero(); 4])],
                    vec![TextInfo::new(word, 0.9)],
                )
                .unwrap();
                signs.ingest_frame(Arc::new(frame));
            }
        });
        scope.spawn(|| {
            let mut tracker = ConsistencyTracker::default();
            for index in 0..400 {
                signs.track(
                    &mut tracker,
                    FrameInput {
                        index,
                        timestamp: index as f64,
                        image_path: image,
                    },
                );
            }
            assert_eq!(tracker.calls, 400);
        });
    });
    assert_eq!(signs.frame_count(), 400);
}

#[test]
fn reader_reports_file_size_and_script() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("mean.txt");
    let content = "中文,0.9\n中ab,0.8\nEXIT,0.7\n";
    fs::write(&path, content).unwrap();

    let decoded = TextReader::default().read(&path).unwrap();
    assert_eq!(decoded.byte_len, content.len());
    let scripts = decoded
        .records
        .iter()
        .map(|record| record.script)
        .collect::<Vec<_>>();
    assert_eq!(
        scripts,
        vec![ScriptKind::MultiByte, ScriptKind::Mixed, ScriptKind::SingleByte]
    );
}
