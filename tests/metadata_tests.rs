// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Metadata regeneration through the rewrite mode.

mod common;

use common::{audio, filepositions, metadata_of, on_metadata, read_tags, temp_dir, video, write_flv};
use flvforge::{FlvReader, FlvRewriter, PipelineOptions, Properties, ScriptValue, TagType};

#[test]
fn test_three_video_frames_without_metadata() {
    let (dir, _guard) = temp_dir("meta_three_frames");
    let input = dir.join("in.flv");
    let output = dir.join("out.flv");
    let offsets = write_flv(
        &input,
        &[video(0, 0, true), video(1000, 0, false), video(2000, 0, false)],
    );

    let mut rewriter = FlvRewriter::new(PipelineOptions::default()).unwrap();
    let report = rewriter.info(&input).unwrap();
    assert_eq!(report.old_size, 0);
    assert_eq!(report.delta, report.new_size as i64);

    let stats = rewriter.rewrite(&input, &output, true).unwrap();
    assert!(stats.metadata_written);
    assert_eq!(stats.frames_written, 3);

    let tags = read_tags(&output);
    assert_eq!(tags.len(), 4);
    assert_eq!(tags[0].tag_type, TagType::Meta);
    let meta = metadata_of(&tags[0]);
    assert_eq!(meta.get("hasKeyframes"), Some(&ScriptValue::Boolean(true)));

    let positions = filepositions(&meta);
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0] as i64 - offsets[0] as i64, report.delta);
    assert_eq!(tags[1].position, positions[0]);
    assert_eq!(
        meta.get("filesize").and_then(ScriptValue::as_f64),
        Some(std::fs::metadata(&output).unwrap().len() as f64)
    );
}

#[test]
fn test_regeneration_is_idempotent() {
    let (dir, _guard) = temp_dir("meta_idempotent");
    let input = dir.join("in.flv");
    let first = dir.join("first.flv");
    let second = dir.join("second.flv");
    write_flv(&input, &common::av_sequence(3000));

    let mut rewriter = FlvRewriter::new(PipelineOptions::default()).unwrap();
    rewriter.rewrite(&input, &first, true).unwrap();
    let report = rewriter.info(&first).unwrap();
    assert_eq!(report.delta, 0);

    rewriter.rewrite(&first, &second, true).unwrap();
    let first_meta = metadata_of(&read_tags(&first)[0]);
    let second_meta = metadata_of(&read_tags(&second)[0]);
    assert_eq!(filepositions(&first_meta), filepositions(&second_meta));
    assert_eq!(filepositions(&first_meta).len(), 4);
    assert_eq!(
        std::fs::metadata(&first).unwrap().len(),
        std::fs::metadata(&second).unwrap().len()
    );
}

#[test]
fn test_keyframe_positions_point_at_keyframes() {
    let (dir, _guard) = temp_dir("meta_positions");
    let input = dir.join("in.flv");
    let output = dir.join("out.flv");
    let mut tags = vec![on_metadata(
        Properties::new().with("encoder", ScriptValue::string("legacy")),
    )];
    tags.extend(common::av_sequence(2000));
    write_flv(&input, &tags);

    let mut rewriter = FlvRewriter::new(PipelineOptions::default()).unwrap();
    rewriter.rewrite(&input, &output, true).unwrap();

    let meta = metadata_of(&read_tags(&output)[0]);
    let mut reader = FlvReader::open(&output).unwrap();
    for position in filepositions(&meta) {
        reader.seek_to(position).unwrap();
        let tag = reader.read_tag().unwrap().unwrap();
        assert_eq!(tag.tag_type, TagType::Video);
        assert_eq!(tag.body[0] >> 4, 1);
    }
}

#[test]
fn test_tags_before_first_keyframe_are_kept() {
    let (dir, _guard) = temp_dir("meta_audio_before_key");
    let input = dir.join("in.flv");
    let output = dir.join("out.flv");
    write_flv(
        &input,
        &[
            on_metadata(Properties::new().with("duration", ScriptValue::Number(0.0))),
            audio(0, 0),
            video(0, 0, true),
            video(40, 0, false),
        ],
    );

    let mut rewriter = FlvRewriter::new(PipelineOptions::default()).unwrap();
    let stats = rewriter.rewrite(&input, &output, true).unwrap();
    assert_eq!(stats.frames_written, 3);

    let tags = read_tags(&output);
    let types: Vec<_> = tags.iter().map(|t| t.tag_type).collect();
    assert_eq!(
        types,
        vec![TagType::Meta, TagType::Audio, TagType::Video, TagType::Video]
    );

    let meta = metadata_of(&tags[0]);
    assert_eq!(filepositions(&meta), vec![tags[2].position]);
    assert_eq!(
        meta.get("filesize").and_then(ScriptValue::as_f64),
        Some(std::fs::metadata(&output).unwrap().len() as f64)
    );
    let mut reader = FlvReader::open(&output).unwrap();
    reader.seek_to(tags[2].position).unwrap();
    assert!(reader.read_frame().unwrap().unwrap().is_video_keyframe());
}

#[test]
fn test_later_metadata_is_kept() {
    let (dir, _guard) = temp_dir("meta_not_first");
    let input = dir.join("in.flv");
    let output = dir.join("out.flv");
    write_flv(
        &input,
        &[
            audio(0, 0),
            on_metadata(Properties::new().with("width", ScriptValue::Number(320.0))),
            video(0, 0, true),
        ],
    );

    let mut rewriter = FlvRewriter::new(PipelineOptions::default()).unwrap();
    rewriter.rewrite(&input, &output, true).unwrap();

    let tags = read_tags(&output);
    let types: Vec<_> = tags.iter().map(|t| t.tag_type).collect();
    assert_eq!(
        types,
        vec![TagType::Meta, TagType::Audio, TagType::Meta, TagType::Video]
    );
    let meta = metadata_of(&tags[0]);
    assert_eq!(meta.get("width").and_then(ScriptValue::as_f64), Some(320.0));
    assert_eq!(filepositions(&meta), vec![tags[3].position]);
}

#[test]
fn test_derived_values() {
    let (dir, _guard) = temp_dir("meta_derived");
    let input = dir.join("in.flv");
    let mut tags = Vec::new();
    for dts in (0..=4000).step_by(100) {
        tags.push(video(dts, 0, dts % 2000 == 0));
        tags.push(audio(dts, 0));
    }
    write_flv(&input, &tags);

    let report = FlvRewriter::new(PipelineOptions::default())
        .unwrap()
        .info(&input)
        .unwrap();
    let number = |key: &str| report.metadata.get(key).and_then(ScriptValue::as_f64).unwrap();

    assert_eq!(number("duration"), 4.0);
    assert_eq!(number("lasttimestamp"), 4.0);
    assert_eq!(number("lastkeyframetimestamp"), 4.0);
    // 41 video frames over 4 seconds.
    assert_eq!(number("framerate"), 10.0);
    assert_eq!(number("videodatarate"), 41.0 * 6.0 / 4.0 * 8.0 / 1000.0);
    assert_eq!(number("audiosamplerate"), 44100.0);
    assert_eq!(number("audiosamplesize"), 16.0);
    assert_eq!(number("audiocodecid"), 10.0);
    assert_eq!(number("videocodecid"), 7.0);
    assert_eq!(report.metadata.get("stereo"), Some(&ScriptValue::Boolean(true)));
    assert_eq!(report.keyframes.len(), 3);
}
