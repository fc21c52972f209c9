// Fixture data for development environments. Loaded once; re-running on a
// populated store is a no-op.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::Price;
use crate::repo::{locations, products, users};

#[derive(Debug, Serialize)]
pub struct SeedSummary {
    pub countries: usize,
    pub cities: usize,
    pub universities: usize,
    pub users: usize,
    pub products: usize,
}

pub async fn seed_all(pool: &SqlitePool) -> AppResult<SeedSummary> {
    let (existing,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM countries")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::from_sqlx(e, "seed"))?;
    if existing > 0 {
        info!("Store already seeded, skipping");
        return Ok(SeedSummary {
            countries: 0,
            cities: 0,
            universities: 0,
            users: 0,
            products: 0,
        });
    }

    let mut summary = SeedSummary {
        countries: 0,
        cities: 0,
        universities: 0,
        users: 0,
        products: 0,
    };

    let fixtures = [
        ("United States", vec![("Boston", vec!["MIT", "Harvard University"])]),
        ("Canada", vec![("Toronto", vec!["University of Toronto"])]),
        ("Germany", vec![("Munich", vec!["TU Munich"])]),
    ];

    let mut first_city_id = None;
    let mut first_country_id = None;

    for (country_name, cities) in fixtures {
        let country = locations::create_country(pool, country_name).await?;
        summary.countries += 1;
        first_country_id.get_or_insert(country.id);

        for (city_name, universities) in cities {
            let city = locations::create_city(pool, city_name, country.id).await?;
            summary.cities += 1;
            first_city_id.get_or_insert(city.id);

            for university_name in universities {
                locations::create_university(pool, university_name, city.id, country.id).await?;
                summary.universities += 1;
            }
        }
    }

    let demo_users = [
        ("seed-clerk-1", "grace", "grace@campus.edu"),
        ("seed-clerk-2", "alan", "alan@campus.edu"),
        ("seed-clerk-3", "ada", "ada@campus.edu"),
    ];

    for (clerk_id, username, email) in demo_users {
        users::create(
            pool,
            users::NewUser {
                clerk_user_id: clerk_id.to_string(),
                username: username.to_string(),
                email: email.to_string(),
                country_id: first_country_id,
                city_id: first_city_id,
                university_id: None,
            },
        )
        .await?;
        summary.users += 1;
    }

    let demo_products = [
        ("Calculus textbook", "Stewart, 8th edition, barely used", 35.0, "Books", "Like New"),
        ("Dorm desk lamp", "LED lamp with USB charging port", 12.5, "Furniture", "Good"),
        ("Road bike", "Single speed, new tires", 140.0, "Sports", "Used"),
    ];

    for (i, (title, description, amount, category, condition)) in
        demo_products.into_iter().enumerate()
    {
        let seller = demo_users[i % demo_users.len()].0;
        products::create(
            pool,
            products::NewProduct {
                title: title.to_string(),
                description: description.to_string(),
                price: Price {
                    amount,
                    currency: "USD".to_string(),
                },
                category: category.to_string(),
                images: vec![],
                seller_clerk_id: seller.to_string(),
                city_id: first_city_id,
                country_id: first_country_id,
                condition: condition.to_string(),
            },
        )
        .await?;
        summary.products += 1;
    }

    info!(
        "Seeded {} countries, {} cities, {} universities, {} users, {} products",
        summary.countries, summary.cities, summary.universities, summary.users, summary.products
    );
    Ok(summary)
}
