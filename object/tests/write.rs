//! End-to-end tests: build a logical file in memory, write it, then walk
//! the produced byte stream with a minimal pull parser and check the
//! structural laws of the format.

use dlis_object::{
    CancelToken, Channel, Comment, Frame, LogicalFile, MemorySource, Origin, RepCode,
    StorageUnitLabel, WriteError, WriteOptions,
};

const VR_HEADER: usize = 4;
const SEG_HEADER: usize = 4;

#[derive(Debug, Clone, PartialEq)]
struct RawRecord {
    is_eflr: bool,
    type_code: u8,
    body: Vec<u8>,
}

/// Split a stream into its storage unit label, visible record slices and
/// reassembled logical records, checking the framing laws on the way.
fn parse_stream(stream: &[u8], max_record_length: usize) -> (Vec<u8>, Vec<RawRecord>) {
    assert!(stream.len() >= 80, "stream too short for a label");
    let sul = stream[..80].to_vec();
    assert_eq!(&sul[4..9], b"V1.00");
    assert_eq!(&sul[9..15], b"RECORD");

    let mut records: Vec<RawRecord> = vec![];
    let mut open: Option<RawRecord> = None;
    let mut pos = 80;
    while pos < stream.len() {
        let vr_len = usize::from(u16::from_be_bytes([stream[pos], stream[pos + 1]]));
        assert_eq!(stream[pos + 2], 0xFF);
        assert_eq!(stream[pos + 3], 0x01);
        assert!(vr_len >= VR_HEADER && vr_len <= max_record_length, "VR length bound");
        assert_eq!(vr_len % 2, 0, "VR length must be even");
        let vr_end = pos + vr_len;
        let mut cursor = pos + VR_HEADER;
        while cursor < vr_end {
            let seg_len =
                usize::from(u16::from_be_bytes([stream[cursor], stream[cursor + 1]]));
            assert!(seg_len >= 16, "segment minimum length");
            assert_eq!(seg_len % 2, 0, "segment length must be even");
            assert!(cursor + seg_len <= vr_end, "segment is atomic within its VR");
            let type_code = stream[cursor + 2];
            let flags = stream[cursor + 3];
            assert_eq!(flags & 0x1E, 0, "encryption/checksum/trailing bits stay clear");
            let pad = if flags & 0x01 != 0 {
                usize::from(stream[cursor + seg_len - 1])
            } else {
                0
            };
            let payload = &stream[cursor + SEG_HEADER..cursor + seg_len - pad];
            let is_eflr = flags & 0x80 != 0;
            let predecessor = flags & 0x40 != 0;
            let successor = flags & 0x20 != 0;
            match &mut open {
                Some(record) => {
                    assert!(predecessor, "continuation must flag its predecessor");
                    assert_eq!(record.type_code, type_code);
                    record.body.extend_from_slice(payload);
                }
                None => {
                    assert!(!predecessor, "first segment cannot flag a predecessor");
                    open = Some(RawRecord {
                        is_eflr,
                        type_code,
                        body: payload.to_vec(),
                    });
                }
            }
            if !successor {
                records.push(open.take().expect("a record must be open"));
            }
            cursor += seg_len;
        }
        pos = vr_end;
    }
    assert!(open.is_none(), "the last record must close");
    (sul, records)
}

#[derive(Debug, Clone, PartialEq)]
struct ParsedAttr {
    count: u32,
    code: u8,
    units: Option<String>,
    value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
struct ParsedObject {
    origin: u32,
    copy: u8,
    name: String,
    attrs: Vec<Option<ParsedAttr>>,
}

#[derive(Debug, Clone, PartialEq)]
struct ParsedSet {
    set_type: String,
    template: Vec<(String, Option<u8>)>,
    objects: Vec<ParsedObject>,
}

fn take_uvari(body: &[u8], pos: &mut usize) -> u32 {
    let first = body[*pos];
    if first & 0x80 == 0 {
        *pos += 1;
        u32::from(first)
    } else if first & 0x40 == 0 {
        let v = u32::from(u16::from_be_bytes([body[*pos], body[*pos + 1]]) & 0x3FFF);
        *pos += 2;
        v
    } else {
        let v = u32::from_be_bytes([body[*pos], body[*pos + 1], body[*pos + 2], body[*pos + 3]])
            & 0x3FFF_FFFF;
        *pos += 4;
        v
    }
}

fn take_ident(body: &[u8], pos: &mut usize) -> String {
    let len = usize::from(body[*pos]);
    *pos += 1;
    let s = String::from_utf8(body[*pos..*pos + len].to_vec()).expect("ASCII identifier");
    *pos += len;
    s
}

fn skip_element(body: &[u8], pos: &mut usize, code: u8) {
    match code {
        1 | 13 | 16 => *pos += 2,
        2 | 5 | 6 | 14 | 17 => *pos += 4,
        7 => *pos += 8,
        12 | 15 | 26 => *pos += 1,
        21 => *pos += 8,
        18 | 22 => {
            take_uvari(body, pos);
        }
        19 | 27 => {
            take_ident(body, pos);
        }
        20 => {
            let len = take_uvari(body, pos) as usize;
            *pos += len;
        }
        23 => {
            take_uvari(body, pos);
            *pos += 1;
            take_ident(body, pos);
        }
        24 => {
            take_ident(body, pos);
            take_uvari(body, pos);
            *pos += 1;
            take_ident(body, pos);
        }
        25 => {
            take_ident(body, pos);
            take_uvari(body, pos);
            *pos += 1;
            take_ident(body, pos);
            take_ident(body, pos);
        }
        other => panic!("unexpected representation code {other}"),
    }
}

fn parse_eflr(body: &[u8]) -> ParsedSet {
    let mut pos = 0;
    let descriptor = body[pos];
    pos += 1;
    assert_eq!(descriptor & 0xE0, 0xE0, "record must open with a set component");
    assert!(descriptor & 0x10 != 0, "set type must be present");
    let set_type = take_ident(body, &mut pos);
    if descriptor & 0x08 != 0 {
        take_ident(body, &mut pos);
    }

    let mut template = vec![];
    while pos < body.len() && body[pos] & 0xE0 == 0x20 && body[pos] & 0x10 != 0 {
        let descriptor = body[pos];
        pos += 1;
        let label = take_ident(body, &mut pos);
        let code = if descriptor & 0x04 != 0 {
            let code = body[pos];
            pos += 1;
            Some(code)
        } else {
            None
        };
        assert_eq!(descriptor & 0x0B, 0, "templates carry no count, units or value");
        template.push((label, code));
    }

    let mut objects = vec![];
    while pos < body.len() {
        assert_eq!(body[pos], 0x70, "object component with a name");
        pos += 1;
        let origin = take_uvari(body, &mut pos);
        let copy = body[pos];
        pos += 1;
        let name = take_ident(body, &mut pos);
        let mut attrs = vec![];
        for (_, template_code) in &template {
            if pos >= body.len() || matches!(body[pos], 0x70) {
                attrs.push(None);
                continue;
            }
            let descriptor = body[pos];
            pos += 1;
            if descriptor == 0x00 {
                attrs.push(None);
                continue;
            }
            assert_eq!(descriptor & 0xE0, 0x20);
            assert!(descriptor & 0x01 != 0, "object attributes carry a value");
            let count = if descriptor & 0x08 != 0 {
                take_uvari(body, &mut pos)
            } else {
                1
            };
            let code = if descriptor & 0x04 != 0 {
                let code = body[pos];
                pos += 1;
                code
            } else {
                template_code.expect("code must come from the template")
            };
            let units = if descriptor & 0x02 != 0 {
                Some(take_ident(body, &mut pos))
            } else {
                None
            };
            let start = pos;
            for _ in 0..count {
                skip_element(body, &mut pos, code);
            }
            attrs.push(Some(ParsedAttr {
                count,
                code,
                units,
                value: body[start..pos].to_vec(),
            }));
        }
        objects.push(ParsedObject {
            origin,
            copy,
            name,
            attrs,
        });
    }
    ParsedSet {
        set_type,
        template,
        objects,
    }
}

fn eflr_sets(records: &[RawRecord]) -> Vec<ParsedSet> {
    records
        .iter()
        .filter(|r| r.is_eflr)
        .map(|r| parse_eflr(&r.body))
        .collect()
}

fn set_by_type<'a>(sets: &'a [ParsedSet], set_type: &str) -> &'a ParsedSet {
    sets.iter()
        .find(|s| s.set_type == set_type)
        .unwrap_or_else(|| panic!("no {set_type} set in the stream"))
}

fn minimal_file() -> (LogicalFile, MemorySource) {
    let mut sul = StorageUnitLabel::new("TEST STORAGE SET");
    sul.max_record_length = 8192;
    let mut file = LogicalFile::new(sul, Default::default());

    let mut origin = Origin::new("MY-ORIGIN");
    origin.file_set_number = Some(1);
    file.add_origin(origin).unwrap();

    let depth = file.add_channel(Channel::new("DEPTH")).unwrap();
    let rpm = file.add_channel(Channel::new("RPM")).unwrap();
    let mut frame = Frame::new("MAIN");
    frame.channels = vec![depth, rpm];
    frame.index_type = Some("BOREHOLE-DEPTH".into());
    file.add_frame(frame).unwrap();

    let mut source = MemorySource::new();
    source.insert("DEPTH", vec![0.0_f64]);
    source.insert("RPM", vec![7.5_f64]);
    (file, source)
}

#[test]
fn minimal_frame_single_row() {
    let (file, source) = minimal_file();
    let mut out = vec![];
    let summary = file.write(&mut out, &source, &WriteOptions::default()).unwrap();
    assert_eq!(summary.bytes_written as usize, out.len());
    assert_eq!(summary.frame_rows, 1);

    let (sul, records) = parse_stream(&out, 8192);
    assert_eq!(&sul[15..20], b"08192");

    // the file header record occupies exactly 124 bytes on the wire
    assert_eq!(
        usize::from(u16::from_be_bytes([out[80], out[81]])),
        124
    );
    assert!(records[0].is_eflr);
    assert_eq!(records[0].type_code, 0);

    let sets = eflr_sets(&records);
    let header = set_by_type(&sets, "FILE-HEADER");
    assert_eq!(header.template[0].0, "SEQUENCE-NUMBER");
    assert_eq!(header.template[1].0, "ID");

    let origins = set_by_type(&sets, "ORIGIN");
    assert_eq!(origins.objects[0].name, "MY-ORIGIN");
    assert_eq!(origins.objects[0].origin, 1);

    let channels = set_by_type(&sets, "CHANNEL");
    assert_eq!(channels.objects[0].name, "DEPTH");
    assert_eq!(channels.objects[1].name, "RPM");

    let frames = set_by_type(&sets, "FRAME");
    assert_eq!(frames.objects.len(), 1);
    assert_eq!(frames.objects[0].name, "MAIN");

    // exactly one frame-data record with OBNAME, frame number 1 and two
    // big-endian doubles
    let data: Vec<_> = records.iter().filter(|r| !r.is_eflr).collect();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].type_code, 0);
    let body = &data[0].body;
    assert_eq!(&body[..7], b"\x01\x00\x04MAIN");
    assert_eq!(body[7], 1);
    assert_eq!(&body[8..16], &[0; 8]);
    assert_eq!(&body[16..24], &[0x40, 0x1E, 0, 0, 0, 0, 0, 0]);
    assert_eq!(body.len(), 24);
}

#[test]
fn image_channel_emits_one_record_per_row() {
    let mut file = LogicalFile::new(StorageUnitLabel::new("IMAGES"), Default::default());
    file.add_origin(Origin::new("ORIGIN")).unwrap();
    let mut amplitude = Channel::new("AMPLITUDE");
    amplitude.dimension = vec![5];
    amplitude.representation_code = Some(RepCode::Fdoubl);
    let amplitude = file.add_channel(amplitude).unwrap();
    let mut frame = Frame::new("IMAGE");
    frame.channels = vec![amplitude];
    file.add_frame(frame).unwrap();

    let mut source = MemorySource::new();
    source
        .insert_wide("AMPLITUDE", vec![0.0_f64; 500], 5)
        .unwrap();

    let mut out = vec![];
    let summary = file.write(&mut out, &source, &WriteOptions::default()).unwrap();
    assert_eq!(summary.frame_rows, 100);

    let (_, records) = parse_stream(&out, 8192);
    let data: Vec<_> = records.iter().filter(|r| !r.is_eflr).collect();
    assert_eq!(data.len(), 100);
    for (i, record) in data.iter().enumerate() {
        let mut pos = 0;
        take_uvari(&record.body, &mut pos);
        pos += 1;
        take_ident(&record.body, &mut pos);
        let frame_number = take_uvari(&record.body, &mut pos);
        assert_eq!(frame_number as usize, i + 1, "frame numbers have no gaps");
        let row = &record.body[pos..];
        assert_eq!(row.len(), 40);
        assert!(row.iter().all(|b| *b == 0));
    }
}

#[test]
fn oversized_record_is_split_and_reassembles() {
    let mut sul = StorageUnitLabel::new("SPLIT");
    sul.max_record_length = 2048;
    let mut file = LogicalFile::new(sul, Default::default());
    file.add_origin(Origin::new("ORIGIN")).unwrap();
    let mut comment = Comment::new("BIG");
    comment.text = vec!["x".repeat(10_000)];
    file.add_comment(comment).unwrap();

    let mut out = vec![];
    file.write(&mut out, &MemorySource::new(), &WriteOptions::default())
        .unwrap();

    // parse_stream already checks VR bounds, continuation flags and
    // reassembly; the comment body must carry the full text
    let (_, records) = parse_stream(&out, 2048);
    let comment = records
        .iter()
        .find(|r| r.is_eflr && r.type_code == 6)
        .expect("a script-typed record");
    assert!(comment.body.len() > 10_000);
    let sets = eflr_sets(&records);
    let parsed = set_by_type(&sets, "COMMENT");
    let text = parsed.objects[0].attrs[0].as_ref().unwrap();
    assert_eq!(text.value.len(), 2 + 10_000);

    // at least five segments were needed under a 2048-byte ceiling
    let segment_count = (comment.body.len() + 2040 - 1) / 2040;
    assert!(segment_count >= 5);
}

#[test]
fn chunk_sizes_do_not_change_the_stream() {
    let mut reference: Option<Vec<u8>> = None;
    for (input, output) in [(None, 0), (Some(1), 64), (Some(7), 4096), (Some(1000), 20)] {
        let mut file = LogicalFile::new(StorageUnitLabel::new("CHUNKS"), Default::default());
        file.add_origin(Origin::new("ORIGIN")).unwrap();
        let depth = file.add_channel(Channel::new("DEPTH")).unwrap();
        let mut frame = Frame::new("MAIN");
        frame.channels = vec![depth];
        frame.index_type = Some("TIME".into());
        file.add_frame(frame).unwrap();
        let mut source = MemorySource::new();
        source.insert("DEPTH", (0..999).map(f64::from).collect::<Vec<_>>());

        let options = WriteOptions {
            input_chunk_size: input,
            output_chunk_size: output,
            cancel: CancelToken::new(),
        };
        let mut out = vec![];
        file.write(&mut out, &source, &options).unwrap();
        match &reference {
            None => reference = Some(out),
            Some(reference) => assert_eq!(reference, &out),
        }
    }
}

#[test]
fn explicit_origins_stamp_their_objects() {
    let mut file = LogicalFile::new(StorageUnitLabel::new("ORIGINS"), Default::default());
    let mut first = Origin::new("FIRST");
    first.file_set_number = Some(7);
    file.add_origin(first).unwrap();
    let mut second = Origin::new("SECOND");
    second.file_set_number = Some(42);
    let second = file.add_origin(second).unwrap();

    let mut channel = Channel::new("DEPTH");
    channel.origin = Some(second);
    let depth = file.add_channel(channel).unwrap();
    let mut frame = Frame::new("MAIN");
    frame.channels = vec![depth];
    file.add_frame(frame).unwrap();

    let mut source = MemorySource::new();
    source.insert("DEPTH", vec![1.0_f64, 2.0]);

    let mut out = vec![];
    file.write(&mut out, &source, &WriteOptions::default()).unwrap();
    let (_, records) = parse_stream(&out, 8192);
    let sets = eflr_sets(&records);

    let origins = set_by_type(&sets, "ORIGIN");
    assert_eq!(origins.objects[0].origin, 7);
    assert_eq!(origins.objects[1].origin, 42);

    let channels = set_by_type(&sets, "CHANNEL");
    assert_eq!(channels.objects[0].origin, 42);

    // frames fall back to the defining origin
    let frames = set_by_type(&sets, "FRAME");
    assert_eq!(frames.objects[0].origin, 7);
}

#[test]
fn duplicate_names_get_distinct_copy_numbers() {
    let mut file = LogicalFile::new(StorageUnitLabel::new("COPIES"), Default::default());
    file.add_origin(Origin::new("ORIGIN")).unwrap();
    file.add_zone(dlis_object::Zone::new("Z")).unwrap();
    file.add_zone(dlis_object::Zone::new("Z")).unwrap();

    let mut out = vec![];
    file.write(&mut out, &MemorySource::new(), &WriteOptions::default())
        .unwrap();
    let (_, records) = parse_stream(&out, 8192);
    let sets = eflr_sets(&records);
    let zones = set_by_type(&sets, "ZONE");
    assert_eq!(zones.objects[0].copy, 0);
    assert_eq!(zones.objects[1].copy, 1);
}

#[test]
fn sets_appear_in_dependency_order() {
    let mut file = LogicalFile::new(StorageUnitLabel::new("ORDER"), Default::default());
    file.add_origin(Origin::new("ORIGIN")).unwrap();
    let axis = file.add_axis(dlis_object::Axis::new("AXIS-1")).unwrap();
    let zone = file.add_zone(dlis_object::Zone::new("ZONE-1")).unwrap();
    let mut parameter = dlis_object::Parameter::new("PARAM-1");
    parameter.zones = vec![zone];
    parameter.values = Some(dlis_object::Value::from(vec![1.0_f64]));
    let parameter = file.add_parameter(parameter).unwrap();
    let mut channel = Channel::new("DEPTH");
    channel.axes = vec![axis];
    let depth = file.add_channel(channel).unwrap();
    let mut frame = Frame::new("MAIN");
    frame.channels = vec![depth];
    file.add_frame(frame).unwrap();
    let mut tool = dlis_object::Tool::new("TOOL-1");
    tool.channels = vec![depth];
    tool.parameters = vec![parameter];
    file.add_tool(tool).unwrap();
    let mut message = dlis_object::Message::new("MSG-1");
    message.text = vec!["on bottom".into()];
    file.add_message(message).unwrap();

    let mut source = MemorySource::new();
    source.insert("DEPTH", vec![1.0_f64, 2.0, 3.0]);

    let mut out = vec![];
    file.write(&mut out, &source, &WriteOptions::default()).unwrap();
    let (_, records) = parse_stream(&out, 8192);
    let order: Vec<String> = eflr_sets(&records).iter().map(|s| s.set_type.clone()).collect();
    let expected = [
        "FILE-HEADER",
        "ORIGIN",
        "AXIS",
        "CHANNEL",
        "FRAME",
        "ZONE",
        "PARAMETER",
        "TOOL",
        "MESSAGE",
    ];
    assert_eq!(order, expected);
}

#[test]
fn noformat_blobs_follow_the_frames() {
    let mut file = LogicalFile::new(StorageUnitLabel::new("BLOBS"), Default::default());
    file.add_origin(Origin::new("ORIGIN")).unwrap();
    let mut blob = dlis_object::NoFormat::new("NOTES");
    blob.data = dlis_object::NoFormatData::Text("free form notes".into());
    file.add_no_format(blob).unwrap();

    let mut out = vec![];
    file.write(&mut out, &MemorySource::new(), &WriteOptions::default())
        .unwrap();
    let (_, records) = parse_stream(&out, 8192);
    let blob = records.iter().find(|r| !r.is_eflr).unwrap();
    assert_eq!(blob.type_code, 1);
    let mut pos = 0;
    take_uvari(&blob.body, &mut pos);
    pos += 1;
    assert_eq!(take_ident(&blob.body, &mut pos), "NOTES");
    assert_eq!(&blob.body[pos..], b"\x0ffree form notes");
}

#[test]
fn cancellation_stops_the_write() {
    let (file, source) = minimal_file();
    let cancel = CancelToken::new();
    cancel.cancel();
    let options = WriteOptions {
        cancel,
        ..WriteOptions::default()
    };
    let err = file.write(&mut vec![], &source, &options).unwrap_err();
    assert!(matches!(err, WriteError::Cancelled { .. }));
}

#[test]
fn missing_dataset_fails_before_any_byte() {
    let (file, _) = minimal_file();
    let empty = MemorySource::new();
    let mut out = vec![];
    let err = file.write(&mut out, &empty, &WriteOptions::default()).unwrap_err();
    assert!(matches!(err, WriteError::Validate { .. }));
    assert!(out.is_empty(), "validation precedes the first byte");
}

#[test]
fn write_file_round_trip() {
    let (file, source) = minimal_file();
    let mut buffer = vec![];
    file.write(&mut buffer, &source, &WriteOptions::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output.dlis");
    let summary = file.write_file(&path, &source, &WriteOptions::default()).unwrap();
    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk, buffer);
    assert_eq!(summary.bytes_written as usize, on_disk.len());
}

#[test]
fn channel_code_reaches_the_channel_set() {
    let (file, source) = minimal_file();
    let mut out = vec![];
    file.write(&mut out, &source, &WriteOptions::default()).unwrap();
    let (_, records) = parse_stream(&out, 8192);
    let sets = eflr_sets(&records);
    let channels = set_by_type(&sets, "CHANNEL");
    let slot = channels
        .template
        .iter()
        .position(|(label, _)| label == "REPRESENTATION-CODE")
        .unwrap();
    let attr = channels.objects[0].attrs[slot].as_ref().unwrap();
    // FDOUBL, inferred from the f64 source column
    assert_eq!(attr.value, [7]);
}
