use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::thread;

use sha2::{Digest, Sha256};
use tiffin_archive::Compression;
use tiffin_fetch::{download_all, DownloadError, DownloadRequest, Fetcher};

fn http_response(status: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

/// Serve one canned response per connection, for up to `connections`
/// connections, on a fresh loopback port.
fn serve(response: Vec<u8>, connections: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for _ in 0..connections {
            let Ok((mut socket, _)) = listener.accept() else { return };
            let mut buffer = [0u8; 1024];
            loop {
                match socket.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(read) => {
                        if buffer[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            let _ = socket.write_all(&response);
        }
    });
    format!("http://{addr}/archive")
}

/// A URL nothing is listening on.
fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/archive")
}

fn demo_archive() -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, contents) in
        [("root/bin/hello", &b"#!/bin/sh\necho hi\n"[..]), ("root/fresh.txt", &b"fresh\n"[..])]
    {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_size(contents.len() as u64);
        builder.append_data(&mut header, path, contents).unwrap();
    }
    let tar_data = builder.into_inner().unwrap();
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&tar_data).unwrap();
    encoder.finish().unwrap()
}

fn request_for(urls: Vec<String>, archive: &[u8], destination: std::path::PathBuf) -> DownloadRequest {
    DownloadRequest {
        name: "demo".to_string(),
        urls,
        compression: Compression::TarGz,
        checksum: Some(Sha256::digest(archive).into()),
        root_path: "root".to_string(),
        destination,
        delete_existing: false,
        files_to_make_executable: vec!["bin/hello".to_string()],
    }
}

#[tokio::test]
async fn fetch_buffers_the_body_and_reports_progress() {
    let body = b"hello over http".to_vec();
    let url = serve(http_response("200 OK", &body), 1);

    let mut seen = Vec::new();
    let fetched = Fetcher::new().fetch(&url, |read, total| seen.push((read, total))).await.unwrap();

    assert_eq!(fetched, body);
    let (read, total) = *seen.last().unwrap();
    assert_eq!(read, body.len() as u64);
    assert_eq!(total, body.len() as u64);
}

#[tokio::test]
async fn fetch_fails_on_error_status() {
    let url = serve(http_response("500 Internal Server Error", b"boom"), 1);
    assert!(Fetcher::new().fetch(&url, |_, _| {}).await.is_err());
}

#[test]
fn happy_path_extracts_and_marks_executable() {
    let archive = demo_archive();
    let url = serve(http_response("200 OK", &archive), 1);
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("downloadedSources/demo");

    let errors = download_all(vec![request_for(vec![url], &archive, destination.clone())], 4);

    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(fs::read(destination.join("bin/hello")).unwrap(), b"#!/bin/sh\necho hi\n");
    let mode = fs::metadata(destination.join("bin/hello")).unwrap().permissions().mode();
    assert_ne!(mode & 0o111, 0, "expected the executable bit, got {mode:o}");
    assert!(!temp.path().join("downloadedSources/.demo.partial").exists());
}

#[test]
fn checksum_mismatch_leaves_no_files_behind() {
    let archive = demo_archive();
    let url = serve(http_response("200 OK", &archive), 1);
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("downloadedSources/demo");

    let mut request = request_for(vec![url], &archive, destination.clone());
    let mut checksum = request.checksum.unwrap();
    checksum[0] ^= 0xff;
    request.checksum = Some(checksum);

    let errors = download_all(vec![request], 4);

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], DownloadError::AllMirrorsFailed { .. }), "{:?}", errors[0]);
    assert!(!destination.exists());
}

#[test]
fn mirror_fallback_reaches_the_good_mirror() {
    let archive = demo_archive();
    let dead = refused_url();
    let corrupt = serve(http_response("200 OK", b"wrong bytes entirely"), 1);
    let good = serve(http_response("200 OK", &archive), 1);
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("downloadedSources/demo");

    let errors =
        download_all(vec![request_for(vec![dead, corrupt, good], &archive, destination.clone())], 4);

    assert!(errors.is_empty(), "{errors:?}");
    assert!(destination.join("bin/hello").exists());
}

#[test]
fn http_error_falls_back_to_the_next_mirror() {
    let archive = demo_archive();
    let broken = serve(http_response("500 Internal Server Error", b"boom"), 1);
    let good = serve(http_response("200 OK", &archive), 1);
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("downloadedSources/demo");

    let errors =
        download_all(vec![request_for(vec![broken, good], &archive, destination.clone())], 4);

    assert!(errors.is_empty(), "{errors:?}");
    assert!(destination.join("bin/hello").exists());
}

#[test]
fn delete_existing_replaces_the_destination() {
    let archive = demo_archive();
    let url = serve(http_response("200 OK", &archive), 1);
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("repo");
    fs::create_dir_all(&destination).unwrap();
    fs::write(destination.join("stale.txt"), b"old").unwrap();

    let mut request = request_for(vec![url], &archive, destination.clone());
    request.delete_existing = true;
    request.files_to_make_executable.clear();

    let errors = download_all(vec![request], 4);

    assert!(errors.is_empty(), "{errors:?}");
    assert!(!destination.join("stale.txt").exists());
    assert_eq!(fs::read(destination.join("fresh.txt")).unwrap(), b"fresh\n");
}

#[test]
fn unreadable_archive_is_fatal() {
    let garbage = b"definitely not a tarball".to_vec();
    let url = serve(http_response("200 OK", &garbage), 1);
    let temp = tempfile::tempdir().unwrap();
    let destination = temp.path().join("downloadedSources/demo");

    let errors = download_all(vec![request_for(vec![url], &garbage, destination.clone())], 4);

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], DownloadError::Extract { .. }), "{:?}", errors[0]);
    assert!(!destination.exists());
}

#[test]
fn several_requests_share_one_supervisor_run() {
    let archive = demo_archive();
    let temp = tempfile::tempdir().unwrap();
    let mut requests = Vec::new();
    for index in 0..6 {
        let url = serve(http_response("200 OK", &archive), 1);
        let mut request =
            request_for(vec![url], &archive, temp.path().join(format!("out/source-{index}")));
        request.name = format!("source-{index}");
        requests.push(request);
    }

    let errors = download_all(requests, 3);

    assert!(errors.is_empty(), "{errors:?}");
    for index in 0..6 {
        assert!(temp.path().join(format!("out/source-{index}/bin/hello")).exists());
    }
}
