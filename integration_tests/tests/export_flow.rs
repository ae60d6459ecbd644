mod common;

use radar_core::{export_to_dir, ExportError, ExportKind, RadarState};
use radar_schema::sample_items;

#[test]
fn png_and_pdf_exports_are_named_after_the_title() -> anyhow::Result<()> {
    let config = common::test_config();
    let mut state = RadarState::new(config, sample_items(), 5);
    state.set_title("Q3  Market Radar");
    let dir = tempfile::tempdir()?;

    let ticket = state.begin_export(ExportKind::Png).expect("slot free");
    let png = export_to_dir(&ticket.snapshot, ticket.kind, dir.path())?;
    state.finish_export(ticket.kind, Ok(png.clone()));
    assert_eq!(png.file_name().and_then(|name| name.to_str()), Some("q3-market-radar.png"));
    let bytes = std::fs::read(&png)?;
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    let ticket = state.begin_export(ExportKind::Pdf).expect("slot released");
    let pdf = export_to_dir(&ticket.snapshot, ticket.kind, dir.path())?;
    state.finish_export(ticket.kind, Ok(pdf.clone()));
    assert_eq!(pdf.file_name().and_then(|name| name.to_str()), Some("q3-market-radar.pdf"));
    let bytes = std::fs::read(&pdf)?;
    assert!(bytes.starts_with(b"%PDF"));

    assert_eq!(state.last_export(), Some(pdf.as_path()));
    assert!(state.export_in_flight().is_none());
    Ok(())
}

#[test]
fn only_one_export_runs_at_a_time() {
    let config = common::test_config();
    let mut state = RadarState::new(config, sample_items(), 5);

    let ticket = state.begin_export(ExportKind::Pdf).expect("slot free");
    assert_eq!(state.export_in_flight(), Some(ExportKind::Pdf));
    assert!(state.begin_export(ExportKind::Png).is_none());
    assert!(state.begin_export(ExportKind::Pdf).is_none());

    state.finish_export(
        ticket.kind,
        Err(ExportError::EmptyCapture {
            width: 0,
            height: 0,
        }),
    );
    assert!(state.export_in_flight().is_none());
    let banner = state.error().expect("failure reported");
    assert!(banner.starts_with("Could not generate PDF"), "got {banner}");
    assert!(state.begin_export(ExportKind::Png).is_some());
}

#[test]
fn snapshot_is_frozen_when_the_export_starts() {
    let config = common::test_config();
    let mut state = RadarState::new(config, sample_items(), 5);
    state.set_title("Before");

    let ticket = state.begin_export(ExportKind::Png).expect("slot free");
    state.set_title("After");

    assert_eq!(ticket.snapshot.title, "Before");
    assert_eq!(ticket.snapshot.items, state.placed_items());
}
