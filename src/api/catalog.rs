use rocket::{serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::session::CategoryDescription,
    catalog::{Allergy, Category, COMMON_ALLERGIES},
    menu::{self, FoodItem, MenuSection, MENU},
};

pub fn routes() -> Vec<Route> {
    routes![categories, allergies, full_menu, foods, section_foods, subcategory_foods]
}

#[get("/categories")]
fn categories() -> Json<Vec<CategoryDescription>> {
    Json(Category::ALL.into_iter().map(Into::into).collect())
}

#[get("/allergies")]
fn allergies() -> Json<&'static [Allergy]> {
    Json(&COMMON_ALLERGIES[..])
}

/// The whole menu, grouped by section and subcategory.
#[get("/menu")]
fn full_menu() -> Json<&'static [MenuSection]> {
    Json(&MENU[..])
}

/// Every dish, or those whose name contains `q`.
#[get("/foods?<q>")]
fn foods(q: Option<&str>) -> Json<Vec<&'static FoodItem>> {
    match q {
        Some(query) => Json(menu::search_foods(query)),
        None => Json(menu::all_foods().collect()),
    }
}

#[get("/foods/<section_id>")]
fn section_foods(section_id: &str) -> Result<Json<Vec<&'static FoodItem>>> {
    let section = menu::section(section_id)
        .ok_or_else(|| Error::not_found(format!("Menu section '{section_id}'")))?;
    Ok(Json(section.foods().collect()))
}

#[get("/foods/<section_id>/<subcategory_id>")]
fn subcategory_foods(
    section_id: &str,
    subcategory_id: &str,
) -> Result<Json<&'static [FoodItem]>> {
    let subcategory = menu::section(section_id)
        .and_then(|section| section.subcategory(subcategory_id))
        .ok_or_else(|| {
            Error::not_found(format!("Menu subcategory '{section_id}/{subcategory_id}'"))
        })?;
    Ok(Json(subcategory.foods))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::Status,
        local::asynchronous::Client,
        serde::json::{serde_json, Value},
    };

    use super::*;

    #[backend_test]
    async fn list_categories(client: Client) {
        let response = client.get("/categories").dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let categories = serde_json::from_str::<Vec<CategoryDescription>>(&raw_response).unwrap();
        let ids: Vec<_> = categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, Category::ALL.to_vec());
        assert_eq!(categories[4].label, "Fast Food");
    }

    #[backend_test]
    async fn list_allergies(client: Client) {
        let response = client.get("/allergies").dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let raw_response = response.into_string().await.unwrap();
        let allergies = serde_json::from_str::<Vec<Value>>(&raw_response).unwrap();
        assert_eq!(allergies.len(), COMMON_ALLERGIES.len());
        assert_eq!(allergies[0]["id"], "peanut");
    }

    async fn food_ids(client: &Client, uri: &str) -> Vec<String> {
        let response = client.get(uri.to_string()).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        serde_json::from_str::<Vec<Value>>(&raw_response)
            .unwrap()
            .iter()
            .map(|food| food["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[backend_test]
    async fn browse_menu(client: Client) {
        let response = client.get("/menu").dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let raw_response = response.into_string().await.unwrap();
        let sections = serde_json::from_str::<Vec<Value>>(&raw_response).unwrap();
        assert_eq!(sections.len(), MENU.len());
        assert_eq!(sections[0]["id"], "korean");
        assert_eq!(sections[0]["subcategories"][0]["foods"][0]["id"], "kimchi_stew");
        assert_eq!(sections[0]["subcategories"][0]["foods"][0]["subcategory"], "stew");

        assert_eq!(
            food_ids(&client, "/foods").await.len(),
            menu::all_foods().count()
        );
        assert_eq!(food_ids(&client, "/foods/japanese").await.len(), 17);
        assert_eq!(
            food_ids(&client, "/foods/asian/vietnamese").await,
            ["pho", "banh_mi", "bun_bo_hue"]
        );
    }

    #[backend_test]
    async fn search_menu(client: Client) {
        assert_eq!(food_ids(&client, "/foods?q=ramen").await, ["ramen"]);
        assert_eq!(
            food_ids(&client, "/foods?q=Sashimi").await,
            ["sashimi", "salmon_sashimi", "tuna_sashimi"]
        );
        assert!(food_ids(&client, "/foods?q=haggis").await.is_empty());
    }

    #[backend_test]
    async fn unknown_menu_entries(client: Client) {
        let response = client.get("/foods/martian").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let response = client.get("/foods/korean/pizza").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
