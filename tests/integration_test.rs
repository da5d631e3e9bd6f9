use std::fs;
use std::io::{self, Cursor, Write};
use std::path::PathBuf;

use rand::{Rng, XorShiftRng};
use samdisk::basic::fpc::{self, Number, MAX_INTEGER, MIN_INTEGER};
use samdisk::basic::Program;
use samdisk::disk::directory::{Variant, FILE_TYPE_BASIC};
use samdisk::disk::{self, Dos, DiskError, SamDos, SectorStore, BLOCK_SIZE, MGT_GEOMETRY};

const ITERATIONS: usize = 1000;
const RNG_SEED: [u8; 16] = [
    0x53, 0x41, 0x4d, 0x20, 0x43, 0x6f, 0x75, 0x70, 0xe9, 0x20, 0x31, 0x39, 0x38, 0x39, 0x0d, 0xff,
];
const FILE_HEADER_SIZE: usize = 9;
const DATA_BYTES_PER_SECTOR: usize = 510;
const STRING_LENGTH: usize = 600;

fn deterministic_rng() -> XorShiftRng {
    rand::SeedableRng::from_seed(RNG_SEED)
}

/// Offset of a sector within a flat MGT image.
fn image_offset(side: usize, track: usize, sector: usize) -> usize {
    ((track * 2 + side) * 10 + sector - 1) * BLOCK_SIZE
}

fn int(value: i32) -> [u8; 5] {
    fpc::encode_integer(value).unwrap()
}

fn paged(value: usize) -> [u8; 3] {
    [
        (value / 16384) as u8,
        (value % 16384) as u8,
        ((value % 16384) >> 8) as u8,
    ]
}

fn line(number: u16, body: &[u8]) -> Vec<u8> {
    let mut bytes = number.to_be_bytes().to_vec();
    bytes.extend_from_slice(&(body.len() as u16).to_le_bytes());
    bytes.extend_from_slice(body);
    bytes
}

/// A program, its numeric variables, and its string variables, followed by
/// the three region boundaries.
fn basic_file() -> (Vec<u8>, [usize; 3]) {
    let mut data = line(10, b"\xbb\"hello\"\x0d");
    let mut body = b"\xc0i=1\x0e".to_vec();
    body.extend_from_slice(&int(1));
    body.extend_from_slice(b"\x8e5\x0e");
    body.extend_from_slice(&int(5));
    body.push(0x0d);
    data.extend(line(20, &body));
    let mut body = b"\xb410\x0e".to_vec();
    body.extend_from_slice(&int(10));
    body.push(0x0d);
    data.extend(line(30, &body));
    data.push(0xff);
    let program = data.len();

    // Numeric variables: x = 42.
    let mut nvar = vec![0xffu8; 52];
    let record = nvar.len();
    nvar[(b'x' - b'a') as usize * 2] = record as u8;
    nvar[(b'x' - b'a') as usize * 2 + 1] = 0;
    nvar.extend_from_slice(&[0x00, 0x00, 0xff]);
    nvar.extend_from_slice(&int(42));
    data.extend(nvar);
    let nvar_end = data.len();

    // A gap, then a long string and a 2x3 numeric array.
    data.extend_from_slice(&[0u8; 4]);
    let svar_start = data.len();
    data.push(0x01);
    data.push(b'n');
    data.extend_from_slice(&paged(STRING_LENGTH));
    data.extend(std::iter::repeat(b'A').take(STRING_LENGTH));
    let mut payload = vec![2, 2, 0, 3, 0];
    for value in 1..=6 {
        payload.extend_from_slice(&int(value));
    }
    data.push(0x20 | 0x01);
    data.push(b'm');
    data.extend_from_slice(&paged(payload.len()));
    data.extend(payload);

    (data, [program, nvar_end, svar_start])
}

/// Write a directory record into the first half of a sector.
fn directory_record(
    image: &mut [u8],
    offset: usize,
    file_type: u8,
    name: &[u8],
    first: (u8, u8),
    length: usize,
    layout: Option<[usize; 3]>,
) {
    let record = &mut image[offset..offset + 256];
    record[0] = file_type;
    record[1..11].copy_from_slice(b"          ");
    record[1..1 + name.len()].copy_from_slice(name);
    record[13] = first.0;
    record[14] = first.1;
    if let Some(layout) = layout {
        for (i, value) in layout.iter().enumerate() {
            record[221 + i * 3..224 + i * 3].copy_from_slice(&paged(*value));
        }
    }
    record[239..242].copy_from_slice(&paged(length));
}

/// Build a SAMDOS image holding the BASIC file in slot 1 (chained from side
/// 0 track 4 sector 1 across the following sectors, the second one on side
/// 1), a deleted entry in slot 2, and a code file in slot 3 whose chain is
/// shorter than its declared length.
fn sample_image() -> (Vec<u8>, Vec<u8>) {
    let mut image = vec![0u8; MGT_GEOMETRY.size()];
    let (data, layout) = basic_file();

    let mut contents = vec![FILE_TYPE_BASIC];
    contents.extend_from_slice(&[0u8; FILE_HEADER_SIZE - 1]);
    contents.extend_from_slice(&data);
    let chain = [(0, 4, 1), (1, 4, 1), (0, 4, 2)];
    let sectors: Vec<&[u8]> = contents.chunks(DATA_BYTES_PER_SECTOR).collect();
    assert!(sectors.len() <= chain.len());
    for (i, chunk) in sectors.iter().enumerate() {
        let (side, track, sector) = chain[i];
        let start = image_offset(side, track, sector);
        image[start..start + chunk.len()].copy_from_slice(chunk);
        if let Some(&(next_side, next_track, next_sector)) = chain.get(i + 1) {
            if i + 1 < sectors.len() {
                image[start + 510] = (next_side << 7 | next_track) as u8;
                image[start + 511] = next_sector as u8;
            }
        }
    }

    let directory = image_offset(0, 0, 1);
    directory_record(
        &mut image,
        directory,
        FILE_TYPE_BASIC,
        b"hello",
        (4, 1),
        data.len(),
        Some(layout),
    );
    directory_record(&mut image, directory + 256, 0, b"gone", (4, 5), 10, None);
    // The code file's single sector only holds 510 bytes.
    directory_record(
        &mut image,
        image_offset(0, 0, 2),
        19,
        b"code",
        (5, 1),
        2000,
        None,
    );
    let start = image_offset(0, 5, 1);
    image[start..start + 9].copy_from_slice(&[19, 0xd0, 0x07, 0, 0x80, 0, 0, 0, 1]);

    (image, data)
}

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("samdisk-{}-{}", std::process::id(), name));
    path
}

#[test]
fn test_listing_and_extraction() {
    let (image, data) = sample_image();
    let dos = SamDos::new(SectorStore::load(&image)).unwrap();

    let names: Vec<String> = dos.iter().map(|e| e.filename.trimmed()).collect();
    assert_eq!(names, vec!["hello", "code"]);
    let slots: Vec<u16> = dos.iter().map(|e| e.slot).collect();
    assert_eq!(slots, vec![1, 3]);

    let file = dos.extract_file(1).unwrap();
    assert_eq!(file.header.file_type(), FILE_TYPE_BASIC);
    assert_eq!(file.data, data);

    let e = dos.extract_file(2).err().unwrap();
    assert!(e == DiskError::NotFound);
    let e = dos.extract_file(3).err().unwrap();
    assert!(e == DiskError::TruncatedChain);
    assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn test_program_report() {
    let (image, _) = sample_image();
    let dos = SamDos::new(SectorStore::load(&image)).unwrap();
    let file = dos
        .open_file_from_entry(dos.find_directory_entry("HELLO").unwrap())
        .unwrap();
    let program = Program::decode(&file);

    assert_eq!(program.name, "hello");
    let lines: Vec<(u16, String)> = program
        .lines
        .iter()
        .map(|l| (l.number, l.text.clone().unwrap()))
        .collect();
    assert_eq!(
        lines,
        vec![
            (10, "PRINT \"hello\"".to_string()),
            (20, "FOR i=11 TO 55".to_string()),
            (30, "GO TO 1010".to_string()),
        ]
    );
    assert!(program.trailing.is_empty());
    assert_eq!(program.numeric_variables.len(), 1);
    assert_eq!(program.string_variables.len(), 2);

    let report = program.to_string();
    assert!(report.contains("0000    10 PRINT \"hello\"\n"));
    assert!(report.contains("Numeric variables:\n  x = 42\n"));
    assert!(report.contains(&format!("  n$ = \"{}\"\n", "A".repeat(STRING_LENGTH))));
    assert!(report.contains("  m(2,3) = [[1, 2, 3], [4, 5, 6]]\n"));
}

#[test]
fn test_short_image_keeps_directory() {
    let (image, _) = sample_image();
    // Only the first two tracks survive.
    let store = SectorStore::load(&image[..image_offset(0, 2, 1)]);
    let dos = SamDos::new(store).unwrap();
    assert_eq!(dos.iter().count(), 2);
    assert_eq!(
        dos.read_sector(samdisk::disk::Location::new(0, 79, 10))
            .unwrap(),
        &[0u8; BLOCK_SIZE][..]
    );
    // The file's sectors were lost with the rest of the image.
    let e = dos.extract_file(1).err().unwrap();
    assert!(e == DiskError::TruncatedChain);
}

#[test]
fn test_open_zipped_image() {
    let (image, data) = sample_image();
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("disk.mgt", zip::write::SimpleFileOptions::default())
        .unwrap();
    zip.write_all(&image).unwrap();
    let archive = zip.finish().unwrap().into_inner();

    let path = temp_path("zipped.zip");
    fs::write(&path, &archive).unwrap();
    let dos = disk::open_dos(&path, Variant::SamDos);
    fs::remove_file(&path).unwrap();
    let dos = dos.unwrap();

    assert_eq!(dos.to_string(), "SAM DOS:");
    let entry = dos.resolve("1").unwrap();
    assert_eq!(entry.filename.trimmed(), "hello");
    assert_eq!(dos.open_file_from_entry(entry).unwrap().data, data);
}

#[test]
fn test_masterdos_reads_samdos_image() {
    let (image, _) = sample_image();
    let path = temp_path("plain.mgt");
    fs::write(&path, &image).unwrap();
    let dos = disk::open_dos(&path, Variant::MasterDos);
    fs::remove_file(&path).unwrap();
    let dos = dos.unwrap();

    assert_eq!(dos.name(), "MASTER DOS");
    let names: Vec<String> = dos.iter().map(|e| e.filename.trimmed()).collect();
    assert_eq!(names, vec!["hello", "code"]);
}

#[test]
fn test_integer_numbers_round_trip() {
    let mut rng = deterministic_rng();
    for _ in 0..ITERATIONS {
        let value = rng.gen_range(MIN_INTEGER, MAX_INTEGER + 1);
        let bytes = fpc::encode_integer(value).unwrap();
        assert_eq!(fpc::decode(&bytes), Ok(Number::Integer(value)));

        // And from the byte side: any sign and magnitude.
        let sign = if rng.gen::<bool>() { 0xff } else { 0x00 };
        let bytes = [0, sign, rng.gen::<u8>(), rng.gen::<u8>(), 0];
        match fpc::decode(&bytes) {
            Ok(Number::Integer(value)) => assert_eq!(fpc::encode_integer(value), Some(bytes)),
            other => panic!("{:?} decoded as {:?}", bytes, other),
        }
    }
}
