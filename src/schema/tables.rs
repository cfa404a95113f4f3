//! Listing schemas for the API resources turned into tables

use super::types::*;

pub static PEOPLE: ListingSchema = ListingSchema {
    category: Category::People,
    columns: &[
        Column::scalar("name"),
        Column::scalar("birth_year"),
        Column::scalar("eye_color"),
        Column::scalar("gender"),
        Column::scalar("hair_color"),
        Column::scalar("height").numeric(),
        Column::scalar("mass").numeric(),
        Column::scalar("skin_color"),
        Column::scalar("homeworld").references(Category::Planets),
        Column::singular("species").references(Category::Species),
    ],
    indicator_fields: &[Category::Films, Category::Starships, Category::Vehicles],
    era_column: Some("birth_year"),
};
