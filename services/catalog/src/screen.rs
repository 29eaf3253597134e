//! Products screen state
//!
//! Everything a products UI binds to: the product form in create or edit
//! mode, the attached image, field and top-level errors, the delete
//! confirmation and the list view.

use std::sync::Arc;

use common::error::AppError;
use common::validation::{FormInput, ValidationErrors};
use tracing::debug;

use crate::list_view::{ListViewState, Page};
use crate::models::product::{Product, ProductId};
use crate::storage::ImageFile;
use crate::store::ProductStore;

/// What `submit` does with the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Create,
    Edit(ProductId),
}

pub struct ProductsScreen {
    store: Arc<ProductStore>,
    mode: FormMode,
    input: FormInput,
    image: Option<ImageFile>,
    field_errors: ValidationErrors,
    error: Option<String>,
    pending_delete: Option<Product>,
    list: ListViewState,
}

impl ProductsScreen {
    pub fn new(store: Arc<ProductStore>) -> Self {
        Self {
            store,
            mode: FormMode::Create,
            input: FormInput::new(),
            image: None,
            field_errors: ValidationErrors::default(),
            error: None,
            pending_delete: None,
            list: ListViewState::new(),
        }
    }

    pub fn store(&self) -> &Arc<ProductStore> {
        &self.store
    }

    /// Load the owner's products; returns whether it succeeded
    pub async fn load(&mut self) -> bool {
        self.error = None;
        let result = self.store.fetch_all().await.map(|_| ());
        self.settle(result)
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn input(&self) -> &FormInput {
        &self.input
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.input.set(name, value);
    }

    pub fn attach_image(&mut self, file: ImageFile) {
        self.image = Some(file);
    }

    pub fn detach_image(&mut self) {
        self.image = None;
    }

    pub fn image(&self) -> Option<&ImageFile> {
        self.image.as_ref()
    }

    pub fn field_errors(&self) -> &ValidationErrors {
        &self.field_errors
    }

    /// Message of the last failed operation
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the submit and delete controls should be disabled
    pub fn is_submitting(&self) -> bool {
        self.store.is_mutating()
    }

    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    /// Switch the form to editing a cached product
    pub async fn begin_edit(&mut self, id: ProductId) -> bool {
        let Some(product) = self.store.find(id).await else {
            self.error = Some(format!("Product {} not found", id));
            return false;
        };

        debug!("Editing product {}", id);
        self.reset_form();
        self.input = product.to_form();
        self.mode = FormMode::Edit(id);
        true
    }

    /// Leave edit mode and clear the form
    pub fn cancel_edit(&mut self) {
        self.reset_form();
    }

    /// Create or update depending on the form mode
    ///
    /// On success the form is reset. Validation failures land in
    /// [`Self::field_errors`], anything else in [`Self::error`]. A write
    /// that committed but could not be re-read still counts as a success
    /// and leaves the load failure in [`Self::error`].
    pub async fn submit(&mut self) -> bool {
        self.error = None;
        self.field_errors = ValidationErrors::default();

        let result = match self.mode {
            FormMode::Create => self
                .store
                .create(&self.input, self.image.as_ref())
                .await
                .map(|_| ()),
            FormMode::Edit(id) => self
                .store
                .update(id, &self.input, self.image.as_ref())
                .await
                .map(|_| ()),
        };

        let succeeded = self.settle(result);
        if succeeded {
            self.reset_form();
            self.error = self.store.sync_error().await;
        }
        succeeded
    }

    /// Hold a cached product until the deletion is confirmed or cancelled
    pub async fn request_delete(&mut self, id: ProductId) -> bool {
        match self.store.find(id).await {
            Some(product) => {
                self.pending_delete = Some(product);
                true
            }
            None => {
                self.error = Some(format!("Product {} not found", id));
                false
            }
        }
    }

    pub fn pending_delete(&self) -> Option<&Product> {
        self.pending_delete.as_ref()
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the held product
    ///
    /// The product stays held when another mutation is still pending.
    pub async fn confirm_delete(&mut self) -> bool {
        let Some(target) = self.pending_delete.take() else {
            return false;
        };

        self.error = None;
        let id = target.id;
        let result = self.store.delete(id).await;
        if matches!(result, Err(AppError::Busy)) {
            self.pending_delete = Some(target);
        }
        let succeeded = self.settle(result);
        if succeeded {
            if self.mode == FormMode::Edit(id) {
                self.reset_form();
            }
            self.error = self.store.sync_error().await;
        }
        succeeded
    }

    pub fn list(&self) -> &ListViewState {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ListViewState {
        &mut self.list
    }

    /// Current page of the filtered product list
    pub async fn page(&mut self) -> Page {
        let products = self.store.products().await;
        self.list.view(&products)
    }

    fn reset_form(&mut self) {
        self.mode = FormMode::Create;
        self.input.clear();
        self.image = None;
        self.field_errors = ValidationErrors::default();
    }

    fn settle(&mut self, result: Result<(), AppError>) -> bool {
        match result {
            Ok(()) => true,
            Err(AppError::Validation(errors)) => {
                self.field_errors = errors;
                false
            }
            Err(e) => {
                self.error = Some(e.user_message());
                false
            }
        }
    }
}
