use isis2709tk::geometry::Geometry;
use isis2709tk::iso::{IsoReader, IsoWriter};
use isis2709tk::linewrap::{LineUnwrapReader, LineWrapWriter};
use isis2709tk::record::{decode_record, encode_record, IsoRecord, RawField};

fn field(tag: &[u8; 3], value: &[u8]) -> RawField {
    RawField::new(*tag, value.to_vec())
}

#[test]
fn embedded_newlines_build_exact_bytes() {
    let geom = Geometry::default();
    let rec = IsoRecord::new(vec![
        field(b"SIZ", b"linux^c\n^s1"),
        field(b"SIZ", b"win^c\r\n^s2"),
        field(b"SIZ", b"mac^c\r^s1"),
    ]);
    let bytes = encode_record(&geom, &rec).unwrap();
    let expected = b"000950000000000610004500SIZ001200000SIZ001100012SIZ001000023#linux^c\n^s1#win^c\r\n^s2#mac^c\r^s1##";
    assert_eq!(bytes, expected.to_vec());
}

#[test]
fn custom_terminators_with_line_wrap_round_trip() {
    // spec scenario 5: field_terminator=';', record_terminator='@', line_len=20.
    let geom = Geometry {
        field_terminator: b';',
        record_terminator: b'@',
        ..Geometry::default()
    };
    let rec = IsoRecord::new(vec![
        field(b"OBJ", b"mouse"),
        field(b"OBJ", b"keyboard"),
        field(b"INF", b"old"),
        field(b"SIZ", b"34"),
    ]);

    let raw = encode_record(&geom, &rec).unwrap();
    assert_eq!(raw.len(), 96);

    let mut wrapped = Vec::new();
    {
        let mut w = IsoWriter::new(LineWrapWriter::new(&mut wrapped, 20, b'\n'), geom);
        w.write_record(&rec).unwrap();
        w.into_inner().finish().unwrap();
    }
    let lines: Vec<&[u8]> = wrapped.split(|&b| b == b'\n').collect();
    // 5 content lines plus the trailing empty split.
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[5], b"");

    let unwrapped = LineUnwrapReader::new(wrapped.as_slice(), 20, b'\n');
    let reader = IsoReader::new(unwrapped, geom);
    let parsed: Vec<_> = reader.collect::<isis2709tk::Result<Vec<_>>>().unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].fields, rec.fields);
}

#[test]
fn all_scenarios_parse_then_rebuild_to_identical_bytes() {
    let default_geom = Geometry::default();
    let custom_geom = Geometry { len_len: 1, pos_len: 3, custom_len: 1, ..Geometry::default() };

    let mut f1 = field(b"001", b"a");
    f1.custom = vec![b'X'];
    let f2 = RawField { tag: b"555".to_vec(), custom: vec![b'0'], value: b"test".to_vec() };

    let cases: Vec<(Geometry, IsoRecord)> = vec![
        (
            default_geom,
            IsoRecord::new(vec![field(b"001", b"testing"), field(b"008", b"it")]),
        ),
        (
            default_geom,
            IsoRecord::new(vec![field(b"001", b"a"), field(b"555", b"test")]),
        ),
        (custom_geom, IsoRecord::new(vec![f1, f2])),
        (
            default_geom,
            IsoRecord::new(vec![
                field(b"SIZ", b"linux^c\n^s1"),
                field(b"SIZ", b"win^c\r\n^s2"),
                field(b"SIZ", b"mac^c\r^s1"),
            ]),
        ),
    ];

    for (geom, rec) in cases {
        let bytes = encode_record(&geom, &rec).unwrap();
        let (parsed, n) = decode_record(&geom, &bytes).unwrap();
        assert_eq!(n, bytes.len());
        let rebuilt = encode_record(&geom, &parsed).unwrap();
        assert_eq!(rebuilt, bytes);
    }
}
