//! Products screen flows

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::Identity;
use catalog::repositories::memory::InMemoryProductRepository;
use catalog::storage::memory::InMemoryImageStorage;
use catalog::{
    FormMode, ImageFile, ImageUploader, NewProduct, Product, ProductChanges, ProductId,
    ProductRepository, ProductStore, ProductsScreen, RepositoryError,
};
use common::config::CollisionPolicy;
use common::validation::FormInput;
use tokio::sync::Notify;
use tokio::time::timeout;
use uuid::Uuid;

fn setup() -> (Identity, Arc<InMemoryProductRepository>, Arc<InMemoryImageStorage>, ProductsScreen) {
    let owner = Identity {
        id: Uuid::new_v4(),
        email: Some("ana@example.com".to_string()),
    };
    let repository = Arc::new(InMemoryProductRepository::new());
    let storage = Arc::new(InMemoryImageStorage::new("http://cdn", "imagenes"));
    let uploader = ImageUploader::new(storage.clone(), "productos", CollisionPolicy::Reject);
    let store = Arc::new(ProductStore::new(owner.clone(), repository.clone(), uploader));
    (owner, repository, storage, ProductsScreen::new(store))
}

fn fill(screen: &mut ProductsScreen, name: &str, stock: &str) {
    screen.set_field("name", name);
    screen.set_field("description", "A product");
    screen.set_field("stock", stock);
    screen.set_field("color", "Black");
    screen.set_field("price", "10");
}

fn seeded(owner_id: Uuid, index: i32) -> NewProduct {
    NewProduct {
        owner_id,
        name: format!("Product {}", index),
        description: "Seeded".to_string(),
        stock: index,
        color: if index % 2 == 0 { "Red" } else { "Blue" }.to_string(),
        price: 5.0,
        image_url: None,
    }
}

#[tokio::test]
async fn thirteen_products_paginate_into_two_pages() {
    let (owner, repository, _, mut screen) = setup();
    for index in 1..=13 {
        repository.seed(seeded(owner.id, index)).await;
    }
    assert!(screen.load().await);

    let first = screen.page().await;
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.items.len(), 12);

    screen.list_mut().next_page();
    let second = screen.page().await;
    assert_eq!(second.page_index, 2);
    assert_eq!(second.items.len(), 1);

    screen.list_mut().set_color(Some("red".to_string()));
    let filtered = screen.page().await;
    assert_eq!(filtered.page_index, 1);
    assert_eq!(filtered.total_items, 6);
}

#[tokio::test]
async fn submit_creates_and_resets_the_form() {
    let (_, repository, _, mut screen) = setup();
    fill(&mut screen, "Lamp", "3");
    screen.attach_image(ImageFile::new("lamp.jpg", vec![1, 2]));

    assert!(screen.submit().await);

    assert!(screen.input().is_empty());
    assert!(screen.image().is_none());
    assert_eq!(screen.error(), None);
    let page = screen.page().await;
    assert_eq!(page.items.len(), 1);
    assert_eq!(
        page.items[0].image_url.as_deref(),
        Some("http://cdn/imagenes/productos/lamp.jpg")
    );
    assert_eq!(repository.rows().await.len(), 1);
}

#[tokio::test]
async fn invalid_submit_shows_field_errors_and_keeps_input() {
    let (_, repository, _, mut screen) = setup();
    fill(&mut screen, "", "-2");

    assert!(!screen.submit().await);

    assert_eq!(screen.field_errors().get("name"), Some("Name is required"));
    assert!(screen.field_errors().contains("stock"));
    assert_eq!(screen.input().get("stock"), Some("-2"));
    assert_eq!(screen.error(), None);
    assert_eq!(repository.write_calls(), 0);
}

#[tokio::test]
async fn edit_mode_updates_the_selected_product() {
    let (owner, repository, _, mut screen) = setup();
    let chair = repository.seed(seeded(owner.id, 1)).await;
    assert!(screen.load().await);

    assert!(screen.begin_edit(chair.id).await);
    assert_eq!(screen.mode(), FormMode::Edit(chair.id));
    assert_eq!(screen.input().get("name"), Some("Product 1"));

    screen.set_field("name", "Armchair");
    assert!(screen.submit().await);

    assert_eq!(screen.mode(), FormMode::Create);
    let stored = screen.store().find(chair.id).await.expect("still cached");
    assert_eq!(stored.name, "Armchair");
}

#[tokio::test]
async fn delete_waits_for_confirmation() {
    let (owner, repository, _, mut screen) = setup();
    let mug = repository.seed(seeded(owner.id, 1)).await;
    assert!(screen.load().await);

    assert!(screen.request_delete(mug.id).await);
    assert_eq!(screen.pending_delete(), Some(&mug));
    screen.cancel_delete();
    assert!(!screen.confirm_delete().await);
    assert_eq!(repository.rows().await.len(), 1);

    assert!(screen.request_delete(mug.id).await);
    assert!(screen.confirm_delete().await);
    assert!(screen.pending_delete().is_none());
    assert!(repository.rows().await.is_empty());
    assert!(screen.page().await.items.is_empty());
}

#[tokio::test]
async fn backend_failures_surface_as_messages() {
    let (owner, repository, _, mut screen) = setup();
    repository.seed(seeded(owner.id, 1)).await;
    repository.fail_reads(true);

    assert!(!screen.load().await);
    assert_eq!(
        screen.error(),
        Some("Failed to load products: Data store unavailable: read rejected")
    );

    assert!(!screen.request_delete(42).await);
    assert_eq!(screen.error(), Some("Product 42 not found"));
}

#[tokio::test]
async fn upload_failure_keeps_the_form_for_retry() {
    let (_, repository, storage, mut screen) = setup();
    storage.fail_uploads(true);
    fill(&mut screen, "Lamp", "3");
    screen.attach_image(ImageFile::new("lamp.jpg", vec![1]));

    assert!(!screen.submit().await);

    assert_eq!(
        screen.error(),
        Some("Failed to upload image: Storage error: bucket unreachable")
    );
    assert_eq!(screen.input().get("name"), Some("Lamp"));
    assert!(screen.image().is_some());
    assert_eq!(repository.write_calls(), 0);
}

#[tokio::test]
async fn committed_submit_resets_the_form_even_if_the_refresh_fails() {
    let (_, repository, _, mut screen) = setup();
    repository.fail_reads(true);
    fill(&mut screen, "Lamp", "3");

    assert!(screen.submit().await);

    assert!(screen.input().is_empty());
    assert_eq!(
        screen.error(),
        Some("Failed to load products: Data store unavailable: read rejected")
    );
    assert!(!screen.submit().await);
    assert!(screen.field_errors().contains("name"));
    assert_eq!(repository.rows().await.len(), 1);

    repository.fail_reads(false);
    assert!(screen.load().await);
    assert_eq!(screen.error(), None);
    assert_eq!(screen.page().await.items.len(), 1);
}

#[tokio::test]
async fn retry_after_failed_insert_reuses_the_image_name() {
    let (_, repository, storage, mut screen) = setup();
    repository.fail_writes(true);
    fill(&mut screen, "Lamp", "3");
    screen.attach_image(ImageFile::new("lamp.jpg", vec![1]));

    assert!(!screen.submit().await);
    assert_eq!(
        screen.error(),
        Some("Failed to add product: Data store unavailable: write rejected")
    );
    assert!(!storage.contains("productos/lamp.jpg").await);
    assert!(screen.image().is_some());

    repository.fail_writes(false);
    assert!(screen.submit().await);
    assert_eq!(screen.error(), None);
    assert_eq!(repository.rows().await.len(), 1);
    assert!(storage.contains("productos/lamp.jpg").await);
}

/// Repository whose inserts wait for a signal
struct GatedRepository {
    inner: InMemoryProductRepository,
    gate: Notify,
}

#[async_trait]
impl ProductRepository for GatedRepository {
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Product>, RepositoryError> {
        self.inner.list_by_owner(owner_id).await
    }

    async fn insert(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        self.gate.notified().await;
        self.inner.insert(product).await
    }

    async fn update(
        &self,
        owner_id: Uuid,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        self.inner.update(owner_id, id, changes).await
    }

    async fn delete(&self, owner_id: Uuid, id: ProductId) -> Result<(), RepositoryError> {
        self.inner.delete(owner_id, id).await
    }
}

#[tokio::test]
async fn busy_delete_keeps_the_confirmation_open() {
    let owner = Identity {
        id: Uuid::new_v4(),
        email: None,
    };
    let repository = Arc::new(GatedRepository {
        inner: InMemoryProductRepository::new(),
        gate: Notify::new(),
    });
    let mug = repository.inner.seed(seeded(owner.id, 1)).await;
    let storage = Arc::new(InMemoryImageStorage::new("http://cdn", "imagenes"));
    let uploader = ImageUploader::new(storage, "productos", CollisionPolicy::Reject);
    let store = Arc::new(ProductStore::new(owner, repository.clone(), uploader));
    let mut screen = ProductsScreen::new(Arc::clone(&store));
    assert!(screen.load().await);
    assert!(screen.request_delete(mug.id).await);

    let pending = tokio::spawn({
        let store = Arc::clone(&store);
        async move {
            let form = FormInput::new()
                .with("name", "Lamp")
                .with("description", "A product")
                .with("stock", "1")
                .with("color", "Black")
                .with("price", "10");
            store.create(&form, None).await
        }
    });
    timeout(Duration::from_secs(1), async {
        while !store.is_mutating() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("create started");

    assert!(!screen.confirm_delete().await);
    assert_eq!(screen.pending_delete(), Some(&mug));
    assert!(screen.error().is_some());

    repository.gate.notify_one();
    assert!(pending.await.expect("task completed").is_ok());

    assert!(screen.confirm_delete().await);
    assert!(screen.pending_delete().is_none());
    assert_eq!(repository.inner.rows().await.len(), 1);
}
