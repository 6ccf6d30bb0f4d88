use repertoire_manager::db::{append_song, create_show, create_song, open_database};
use repertoire_manager::export::{export_setlist_pdf, pdf_file_name};
use repertoire_manager::{domain_error, RepertoireError, ShowInput, SongInput};

#[test]
fn empty_setlist_produces_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_database(&dir.path().join("repertorio.db")).unwrap();
    let show = create_show(&conn, &ShowInput::new("01/01/2025", "Bar X", "Trio Y").unwrap()).unwrap();
    let path = dir.path().join(pdf_file_name(&show));

    let err = export_setlist_pdf(&conn, show.id, &path).unwrap_err();

    assert!(matches!(domain_error(&err), Some(RepertoireError::NothingToExport)));
    assert!(!path.exists());
}

#[test]
fn setlist_is_written_as_a_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_database(&dir.path().join("repertorio.db")).unwrap();
    let show = create_show(&conn, &ShowInput::new("01/01/2025", "Bar X", "Trio Y").unwrap()).unwrap();
    for n in 0..25 {
        let song = create_song(
            &conn,
            &SongInput::new(
                &format!("Song number {n}"),
                Some("Someone"),
                None,
                Some("Am"),
                Some("Am7 D7 [intro] -- G7M C7M F#m7(b5) B7 Em"),
            )
            .unwrap(),
        )
        .unwrap();
        append_song(&conn, show.id, song.id).unwrap();
    }
    let path = dir.path().join(pdf_file_name(&show));

    export_setlist_pdf(&conn, show.id, &path).unwrap();

    assert_eq!(path.file_name().unwrap(), "01-01-2025-Trio-Y-Bar-X.pdf");
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn unknown_show_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_database(&dir.path().join("repertorio.db")).unwrap();

    let err = export_setlist_pdf(&conn, 42, &dir.path().join("x.pdf")).unwrap_err();

    assert!(matches!(domain_error(&err), Some(RepertoireError::ShowNotFound(42))));
}
