use drs4tools::calib::ModuleCalibrations;
use drs4tools::de::ModuleReader;
use drs4tools::ser;

mod common;
use common::{event_words, to_bytes, zero_calibrated, Group};

fn tsv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_writer(Vec::new())
}

#[test]
fn one_record_per_sample() {
    let g = Group::ramp(2, 10, 0);
    let bytes = to_bytes(&event_words(9, [None, Some(&g)]));
    let event = ModuleReader::new(4, &bytes[..], ModuleCalibrations::uniform(0.2))
        .next_event()
        .unwrap()
        .unwrap();

    let mut wtr = tsv_writer();
    ser::tsv(&mut wtr, 4, &event).unwrap();
    let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 8 * 2);

    let first: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(&first[..6], &["9", "4", "1", "0", "0", "0.0"]);
    assert_eq!(first[6].parse::<f32>().unwrap(), zero_calibrated(10));

    let last: Vec<&str> = lines[15].split('\t').collect();
    assert_eq!(&last[..5], &["9", "4", "1", "7", "1"]);
    assert!((last[5].parse::<f64>().unwrap() - 0.2).abs() < 1e-12);
    assert_eq!(last[6].parse::<f32>().unwrap(), zero_calibrated(11));
}

#[test]
fn one_summary_per_event() {
    let mut g = Group::ramp(8, 0, 0);
    g.trailer = 77;
    let bytes = to_bytes(&event_words(5, [Some(&g), Some(&g)]));
    let event = ModuleReader::new(1, &bytes[..], ModuleCalibrations::zeroed())
        .next_event()
        .unwrap()
        .unwrap();

    let mut wtr = tsv_writer();
    ser::summary_tsv(&mut wtr, 1, &event).unwrap();
    let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    assert_eq!(out, "5\t1\t5000\t0\t0\t3\t77,77\n");
}
