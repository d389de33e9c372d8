//! 콘솔 리포터 포트 구현 어댑터.

use std::io::{self, Write};

use crate::application::ports::Reporter;

/// 결과는 stdout, 오류는 stderr로 보내는 콘솔 리포터.
#[derive(Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn raw(&self, line: &str) {
        // 파이프가 먼저 닫혀도(`| head`) 패닉하지 않도록 쓰기 오류는 무시한다.
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }

    fn error(&self, message: &str) {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "error: {message}");
    }
}
