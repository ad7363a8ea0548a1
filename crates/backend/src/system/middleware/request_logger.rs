use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use crate::shared::format::format_number;

/// Цвет времени в строке лога: голубой для 200, коричневый для остальных
fn color_code(status: StatusCode) -> &'static str {
    if status == StatusCode::OK {
        "36"
    } else {
        "33"
    }
}

fn print_line(status: StatusCode, method: &Method, path: &str, millis: u128, size: &str) {
    println!(
        "\x1b[{}m{}\x1b[0m | {:>5}ms | {:>12} | {} {:>6} {}",
        color_code(status),
        Utc::now().format("%H:%M:%S"),
        millis,
        size,
        status.as_u16(),
        method,
        path
    );
}

/// Middleware для логирования HTTP запросов
///
/// Выводит в консоль время (UTC), длительность, размер ответа, статус,
/// метод и путь.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // Читаем тело ответа, чтобы узнать реальный размер
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => {
            print_line(
                parts.status,
                &method,
                &path,
                start.elapsed().as_millis(),
                &format_number(bytes.len()),
            );
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(_) => {
            print_line(
                StatusCode::INTERNAL_SERVER_ERROR,
                &method,
                &path,
                start.elapsed().as_millis(),
                "error",
            );
            Response::from_parts(parts, Body::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_code() {
        assert_eq!(color_code(StatusCode::OK), "36");
        assert_eq!(color_code(StatusCode::MULTI_STATUS), "33");
        assert_eq!(color_code(StatusCode::BAD_REQUEST), "33");
    }
}
