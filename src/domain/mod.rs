//! Domain layer
//! 오브젝트 패스/스칼라 값/오퍼레이션 규칙을 입출력 없이 표현한다.

pub mod error;
pub mod instance;
pub mod literal;
pub mod object_path;
pub mod operation;
pub mod params;
pub mod value;
