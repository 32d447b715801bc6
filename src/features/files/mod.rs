//! Stored files: upload, download, listing and deletion.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/files` | Upload a file (multipart field `file`) |
//! | GET | `/files` | List files, newest first |
//! | GET | `/files/{id}` | Download a file |
//! | GET | `/files/{id}/metadata` | Look up metadata only |
//! | DELETE | `/files/{id}` | Delete a file |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgFileRepository;
pub use routes::routes;
pub use services::FileService;
