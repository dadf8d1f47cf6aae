use crate::infra::Portal;
use agri_grants::config::AppConfig;
use agri_grants::error::AppError;
use agri_grants::seed::DEMO_FARMER;
use agri_grants::workflows::grants::applications::{
    ApplicantDetails, ApplicationStatus, StatusChange,
};
use agri_grants::workflows::grants::{
    is_eligible, FarmerId, GrantKind, GrantView, ProfileUpdate,
};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Directory for uploaded documents (defaults to a temp directory).
    #[arg(long)]
    pub(crate) upload_dir: Option<PathBuf>,
    /// Treat approved and rejected decisions as final.
    #[arg(long)]
    pub(crate) enforce_transitions: bool,
    /// Stop after listing the seeded catalog and prices.
    #[arg(long)]
    pub(crate) skip_review: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        upload_dir,
        enforce_transitions,
        skip_review,
    } = args;

    let mut config = AppConfig::load()?;
    config.storage.upload_dir =
        upload_dir.unwrap_or_else(|| std::env::temp_dir().join("agri-grants-demo"));
    config.lifecycle.enforce_transitions = enforce_transitions;

    let portal = Portal::in_memory(&config)?;
    let report = portal.seed_demo()?;

    println!("Agricultural grant portal demo");
    println!(
        "- Seeded {} grants, {} farmer profile(s), {} market prices",
        report.grants, report.farmers, report.market_prices
    );

    let grants = match portal.catalog.list_active() {
        Ok(grants) => grants,
        Err(err) => {
            println!("  Catalog unavailable: {}", err);
            return Ok(());
        }
    };
    println!("\nActive grants");
    for view in &grants {
        println!("  - {}", grant_line(view));
    }

    match portal.market.list_active() {
        Ok(prices) => {
            println!("\nMarket prices");
            for price in prices {
                println!(
                    "  - {} @ {}: {:.2} {}",
                    price.crop_name, price.location, price.price, price.unit
                );
            }
        }
        Err(err) => println!("  Market prices unavailable: {}", err),
    }

    if skip_review {
        return Ok(());
    }

    let farmer = FarmerId(DEMO_FARMER.to_string());
    let profile = match portal.farmers.get_profile(&farmer) {
        Ok(profile) => profile,
        Err(err) => {
            println!("  Demo farmer unavailable: {}", err);
            return Ok(());
        }
    };
    let Some(grant) = grants
        .iter()
        .map(|view| &view.grant)
        .find(|grant| is_eligible(profile.ward_number, &profile.municipality, &grant.target_areas))
    else {
        println!("\nNo active grant targets {}", profile.municipality);
        return Ok(());
    };

    println!("\nApplication intake for {}", profile.full_name);
    let application = match portal
        .intake
        .submit(grant.id, &farmer, demo_details(), Vec::new())
    {
        Ok(application) => application,
        Err(err) => {
            println!("  Submission rejected: {}", err);
            return Ok(());
        }
    };
    println!(
        "- Application {} for grant {} -> status {}",
        application.id, grant.id, application.status
    );

    if let Err(err) = portal
        .intake
        .submit(grant.id, &farmer, demo_details(), Vec::new())
    {
        println!("- Second submission refused: {}", err);
    }

    let outsider = FarmerId("demo-outsider".to_string());
    let registered = portal.farmers.upsert_profile(
        outsider.clone(),
        ProfileUpdate {
            full_name: "Ram Magar".to_string(),
            phone: "9811111111".to_string(),
            email: None,
            address: "Ward 9, Bharatpur".to_string(),
            ward_number: 9,
            municipality: "Bharatpur".to_string(),
        },
    );
    if registered.is_ok() {
        if let Err(err) = portal
            .intake
            .submit(grant.id, &outsider, demo_details(), Vec::new())
        {
            println!("- Farmer outside the target wards refused: {}", err);
        }
    }

    println!("\nReview");
    match portal.review.mark_viewed(application.id, "Ward officer") {
        Ok(viewed) => println!("- First admin view -> status {}", viewed.status),
        Err(err) => println!("  View failed: {}", err),
    }
    match portal.review.update_status(
        application.id,
        StatusChange {
            status: ApplicationStatus::Approved,
            admin_remarks: Some("Land documents verified on site".to_string()),
        },
        "Ward officer",
    ) {
        Ok(decided) => println!(
            "- Decision -> {} ({})",
            decided.status,
            decided.admin_remarks.as_deref().unwrap_or("no remarks")
        ),
        Err(err) => println!("  Decision failed: {}", err),
    }
    match portal.review.update_status(
        application.id,
        StatusChange {
            status: ApplicationStatus::Pending,
            admin_remarks: None,
        },
        "Ward officer",
    ) {
        Ok(reopened) => println!("- Reopened -> {} (transitions not enforced)", reopened.status),
        Err(err) => println!("- Reopen refused: {}", err),
    }

    match portal.catalog.management(grant.id) {
        Ok(view) => println!(
            "\nGrant {} applications: {} total | {} pending | {} processing | {} approved | {} rejected",
            grant.id,
            view.counts.total,
            view.counts.pending,
            view.counts.processing,
            view.counts.approved,
            view.counts.rejected
        ),
        Err(err) => println!("  Management view unavailable: {}", err),
    }

    Ok(())
}

fn grant_line(view: &GrantView) -> String {
    let grant = &view.grant;
    let benefit = match grant.kind {
        GrantKind::Money => grant
            .amount
            .map(|amount| format!("NPR {amount:.0}"))
            .unwrap_or_default(),
        GrantKind::Object => grant.object_name.clone().unwrap_or_default(),
    };
    let areas: Vec<String> = grant
        .target_areas
        .iter()
        .map(|area| format!("{}-{}", area.municipality, area.ward_number))
        .collect();
    format!(
        "#{} {} ({}) | {} application(s) | {}",
        grant.id,
        grant.title,
        benefit,
        view.application_count,
        areas.join(", ")
    )
}

fn demo_details() -> ApplicantDetails {
    ApplicantDetails {
        farmer_name: "Sita Tharu".to_string(),
        farmer_phone: "9800000000".to_string(),
        farmer_email: None,
        farmer_address: "Ward 3, Bharatpur".to_string(),
        farmer_ward: 3,
        farmer_municipality: "Bharatpur".to_string(),
        monthly_income: 15000.0,
        land_size: 1.5,
        land_size_unit: "bigha".to_string(),
        has_received_grant_before: false,
        previous_grant_details: None,
        crop_details: "Paddy and winter wheat".to_string(),
        expected_benefits: "Dry-season irrigation for a second harvest".to_string(),
        additional_notes: None,
    }
}
