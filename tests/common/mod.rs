//! Common test utilities for the nutrition analyzer tests
//!
//! Image fixtures and a one-shot HTTP responder standing in for the vision
//! service.

#![allow(dead_code)]

pub mod fixtures {
    use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    /// Diagonal gradient with enough detail for JPEG to chew on.
    pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y) % 256) as u8,
            ])
        })
    }

    pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format).expect("encode fixture");
        out.into_inner()
    }

    pub fn png_rgb(width: u32, height: u32) -> Vec<u8> {
        encode(&DynamicImage::ImageRgb8(gradient_rgb(width, height)), ImageFormat::Png)
    }

    pub fn png_rgba(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 90, ((x + y) % 256) as u8])
        });
        encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png)
    }

    pub fn png_gray(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::from_fn(width, height, |x, _| Luma([(x % 256) as u8]));
        encode(&DynamicImage::ImageLuma8(img), ImageFormat::Png)
    }

    pub fn jpeg_rgb(width: u32, height: u32) -> Vec<u8> {
        encode(&DynamicImage::ImageRgb8(gradient_rgb(width, height)), ImageFormat::Jpeg)
    }
}

pub mod fake_service {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    /// A listener that answers exactly one HTTP request with a canned response.
    pub struct FakeService {
        pub url: String,
        handle: JoinHandle<String>,
    }

    impl FakeService {
        /// Wait for the request to be served and return it as raw text.
        pub fn captured_request(self) -> String {
            self.handle.join().expect("fake service thread panicked")
        }
    }

    pub struct CannedResponse {
        pub status: u16,
        pub reason: &'static str,
        pub headers: Vec<(&'static str, String)>,
        pub body: String,
        pub delay: Option<Duration>,
    }

    impl CannedResponse {
        pub fn json(status: u16, reason: &'static str, body: impl Into<String>) -> Self {
            Self {
                status,
                reason,
                headers: vec![("Content-Type", "application/json".to_string())],
                body: body.into(),
                delay: None,
            }
        }

        pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
            self.headers.push((name, value.into()));
            self
        }

        pub fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    pub fn serve_once(response: CannedResponse) -> FakeService {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake service");
        let addr = listener.local_addr().expect("local addr");
        let url = format!("http://{}/openai/v1/chat/completions", addr);

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let request = read_request(&mut stream);

            if let Some(delay) = response.delay {
                thread::sleep(delay);
            }

            let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, response.reason);
            for (name, value) in &response.headers {
                head.push_str(&format!("{}: {}\r\n", name, value));
            }
            head.push_str(&format!("Content-Length: {}\r\n", response.body.len()));
            head.push_str("Connection: close\r\n\r\n");

            // The client may have hung up already (timeout tests).
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(response.body.as_bytes());
            let _ = stream.flush();
            request
        });

        FakeService { url, handle }
    }

    /// An address with nothing listening on it.
    pub fn unreachable_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        format!("http://{}/openai/v1/chat/completions", addr)
    }

    fn read_request(stream: &mut std::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 8192];
        let mut header_end = None;
        let mut content_length = 0usize;

        loop {
            let n = match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            data.extend_from_slice(&buf[..n]);

            if header_end.is_none() {
                if let Some(pos) = find(&data, b"\r\n\r\n") {
                    header_end = Some(pos + 4);
                    let head = String::from_utf8_lossy(&data[..pos]).to_ascii_lowercase();
                    content_length = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(0);
                }
            }
            if let Some(end) = header_end {
                if data.len() >= end + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).into_owned()
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }
}
