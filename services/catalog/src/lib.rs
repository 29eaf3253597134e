//! Product catalog for the admin front-end
//!
//! [`ProductStore`] caches the products of one identity and re-reads them
//! after every mutation. [`list_view`] derives the visible page from that
//! cache, and [`ProductsScreen`] holds the form, confirmation and list state
//! a UI binds to. Persistence and image storage are reached through the
//! [`ProductRepository`] and [`ImageStorage`] ports.

pub mod list_view;
pub mod models;
pub mod repositories;
pub mod screen;
pub mod storage;
pub mod store;
pub mod validation;

pub use list_view::{ListViewState, PAGE_SIZE, Page, ProductFilter};
pub use models::product::{NewProduct, Product, ProductChanges, ProductId, ProductInput};
pub use repositories::{ProductRepository, RepositoryError};
pub use screen::{FormMode, ProductsScreen};
pub use storage::{ImageFile, ImageStorage, ImageUploader, StorageError, UploadedImage};
pub use store::ProductStore;
