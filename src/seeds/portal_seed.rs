use crate::database::PortalStore;
use crate::models::{PracticeArea, Service, User, UserRole};

/// Garante que todo email de ADMIN_EMAILS existe na tabela users como admin.
/// Falhas só geram log: o servidor sobe mesmo assim.
pub async fn seed_admin_users(store: &dyn PortalStore, admin_emails: &[String]) {
    if admin_emails.is_empty() {
        log::warn!("⚠️  ADMIN_EMAILS is empty, nobody can use the admin console");
        return;
    }

    for email in admin_emails {
        match store.get_user(email).await {
            Ok(Some(user)) if user.is_admin() => {
                log::debug!("   ℹ️  Admin {} already present", email);
            }
            Ok(_) => match store.save_user(&User::new(email, UserRole::Admin)).await {
                Ok(()) => log::info!("   ✅ Admin user ensured: {}", email),
                Err(e) => log::error!("   ❌ Failed to save admin {}: {}", email, e),
            },
            Err(e) => log::error!("   ❌ Failed to look up admin {}: {}", email, e),
        }
    }
}

/// Seed do catálogo de serviços. Só insere se a tabela estiver vazia.
pub async fn seed_default_services(store: &dyn PortalStore) {
    let count = match store.count_services().await {
        Ok(count) => count,
        Err(e) => {
            log::error!("❌ Could not count services, skipping seed: {}", e);
            return;
        }
    };

    if count > 0 {
        log::info!("📋 Services: {} already in store, skipping seed", count);
        return;
    }

    let services = build_default_services();
    match store.insert_services(&services).await {
        Ok(()) => log::info!("   ✅ Inserted {} default services", services.len()),
        Err(e) => log::error!("   ❌ Failed to seed default services: {}", e),
    }
}

fn service(slug: &str, name: &str, area: PracticeArea, description: &str) -> Service {
    Service {
        id: uuid::Uuid::new_v4().to_string(),
        slug: slug.into(),
        name: name.into(),
        area,
        description: description.into(),
        active: true,
    }
}

fn build_default_services() -> Vec<Service> {
    vec![
        // ── Legal ──
        service(
            "immigration",
            "Immigration & Residence",
            PracticeArea::Legal,
            "Visas, residence permits, renewals and family reunification.",
        ),
        service(
            "company-formation",
            "Company Formation",
            PracticeArea::Legal,
            "Incorporation, articles of association and registry filings.",
        ),
        service(
            "contracts",
            "Contracts Review",
            PracticeArea::Legal,
            "Drafting and review of lease, employment and service contracts.",
        ),
        // ── Accounting ──
        service(
            "bookkeeping",
            "Bookkeeping",
            PracticeArea::Accounting,
            "Monthly bookkeeping from your uploaded bank statements and expenses.",
        ),
        service(
            "tax-returns",
            "Tax Returns",
            PracticeArea::Accounting,
            "Personal and company tax returns, VAT filings and compliance.",
        ),
        // ── Translation ──
        service(
            "certified-translation",
            "Certified Translation",
            PracticeArea::Translation,
            "Certified translations of official documents for courts and registries.",
        ),
    ]
}
