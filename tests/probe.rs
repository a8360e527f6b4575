use object::{Architecture, BinaryFormat, Endianness, SectionKind};
use plugin_loader::safety::{RUNTIME_MARKER_SECTION, image_declares_runtime};
use rstest::rstest;
use std::path::Path;

fn write_image(path: &Path, format: BinaryFormat, segment: &[u8], section: &[u8]) {
    let mut image = object::write::Object::new(format, Architecture::X86_64, Endianness::Little);
    let id = image.add_section(segment.to_vec(), section.to_vec(), SectionKind::Data);
    image.append_section_data(id, &[0u8; 8], 8);
    std::fs::write(path, image.write().unwrap()).unwrap();
}

#[rstest]
fn macho_marker_in_the_data_segment_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marked.dylib");
    write_image(
        &path,
        BinaryFormat::MachO,
        b"__DATA",
        RUNTIME_MARKER_SECTION.as_bytes(),
    );
    assert_eq!(image_declares_runtime(&path), Some(true));
}

#[rstest]
fn macho_without_the_marker_is_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.dylib");
    write_image(&path, BinaryFormat::MachO, b"__DATA", b"__data");
    assert_eq!(image_declares_runtime(&path), Some(false));
}

#[rstest]
fn macho_marker_outside_the_data_segment_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("text.dylib");
    write_image(
        &path,
        BinaryFormat::MachO,
        b"__TEXT",
        RUNTIME_MARKER_SECTION.as_bytes(),
    );
    assert_eq!(image_declares_runtime(&path), Some(false));
}

#[rstest]
fn elf_marker_is_detected_by_section_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("marked.so");
    write_image(
        &path,
        BinaryFormat::Elf,
        b"",
        RUNTIME_MARKER_SECTION.as_bytes(),
    );
    assert_eq!(image_declares_runtime(&path), Some(true));
}

#[rstest]
fn unreadable_images_yield_no_verdict() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(image_declares_runtime(&dir.path().join("missing.so")), None);
    let junk = dir.path().join("junk.so");
    std::fs::write(&junk, b"not an object image").unwrap();
    assert_eq!(image_declares_runtime(&junk), None);
}
