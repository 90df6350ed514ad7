//! The browsable food menu that craving and not-craving selections are
//! picked from.
//!
//! A food's `category` is the menu section it is listed under. Sections whose
//! ID is also a [`Category`](crate::model::catalog::Category) identifier score
//! against that category; the `other` section does not.

use serde::Serialize;

/// A single dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FoodItem {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub subcategory: &'static str,
}

/// A group of dishes within a section, such as noodles or stews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Subcategory {
    pub id: &'static str,
    pub name: &'static str,
    pub foods: &'static [FoodItem],
}

/// A top-level menu section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MenuSection {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
    pub subcategories: &'static [Subcategory],
}

impl MenuSection {
    pub fn foods(&self) -> impl Iterator<Item = &'static FoodItem> {
        let subcategories: &'static [Subcategory] = self.subcategories;
        subcategories.iter().flat_map(|sub| sub.foods.iter())
    }

    pub fn subcategory(&self, id: &str) -> Option<&'static Subcategory> {
        self.subcategories.iter().find(|sub| sub.id == id)
    }
}

macro_rules! foods {
    ($category:literal / $subcategory:literal: $(($id:literal, $name:literal)),+ $(,)?) => {
        &[$(FoodItem {
            id: $id,
            name: $name,
            category: $category,
            subcategory: $subcategory,
        }),+]
    };
}

pub static MENU: [MenuSection; 6] = [
    MenuSection {
        id: "korean",
        name: "Korean",
        emoji: "🍚",
        subcategories: &[
            Subcategory {
                id: "stew",
                name: "Stews",
                foods: foods!("korean" / "stew":
                    ("kimchi_stew", "Kimchi stew"),
                    ("doenjang_stew", "Soybean paste stew"),
                    ("sundubu_stew", "Soft tofu stew"),
                    ("budae_stew", "Army stew"),
                    ("cheonggukjang", "Cheonggukjang"),
                    ("gamjatang", "Pork bone soup"),
                ),
            },
            Subcategory {
                id: "soup",
                name: "Soups",
                foods: foods!("korean" / "soup":
                    ("seolleongtang", "Ox bone soup"),
                    ("galbitang", "Short rib soup"),
                    ("samgyetang", "Ginseng chicken soup"),
                    ("yukgaejang", "Spicy beef soup"),
                    ("miyeokguk", "Seaweed soup"),
                    ("kongnamulguk", "Bean sprout soup"),
                ),
            },
            Subcategory {
                id: "rice",
                name: "Rice dishes",
                foods: foods!("korean" / "rice":
                    ("bibimbap", "Bibimbap"),
                    ("dolsot_bibimbap", "Stone pot bibimbap"),
                    ("kimchi_fried_rice", "Kimchi fried rice"),
                    ("bulgogi_rice", "Bulgogi rice bowl"),
                    ("pork_cutlet_rice", "Pork cutlet rice bowl"),
                ),
            },
            Subcategory {
                id: "grilled",
                name: "Grilled",
                foods: foods!("korean" / "grilled":
                    ("bulgogi", "Bulgogi"),
                    ("galbi", "Galbi"),
                    ("samgyeopsal", "Pork belly"),
                    ("grilled_fish", "Grilled fish"),
                    ("dakgalbi", "Spicy stir-fried chicken"),
                ),
            },
            Subcategory {
                id: "noodles",
                name: "Noodles",
                foods: foods!("korean" / "noodles":
                    ("naengmyeon", "Cold noodles"),
                    ("bibim_naengmyeon", "Spicy cold noodles"),
                    ("janchi_guksu", "Banquet noodles"),
                    ("mul_naengmyeon", "Cold noodle soup"),
                ),
            },
        ],
    },
    MenuSection {
        id: "chinese",
        name: "Chinese",
        emoji: "🥢",
        subcategories: &[
            Subcategory {
                id: "noodles",
                name: "Noodles",
                foods: foods!("chinese" / "noodles":
                    ("jajangmyeon", "Black bean noodles"),
                    ("jjamppong", "Spicy seafood noodles"),
                    ("gan_jajang", "Dry black bean noodles"),
                    ("sacheon_jajang", "Sichuan black bean noodles"),
                    ("ulmyeon", "Ulmyeon"),
                ),
            },
            Subcategory {
                id: "rice",
                name: "Rice dishes",
                foods: foods!("chinese" / "rice":
                    ("fried_rice", "Fried rice"),
                    ("yangzhou_fried_rice", "Yangzhou fried rice"),
                    ("seafood_fried_rice", "Seafood fried rice"),
                ),
            },
            Subcategory {
                id: "dim_sum",
                name: "Dumplings and dim sum",
                foods: foods!("chinese" / "dim_sum":
                    ("mandu", "Dumplings"),
                    ("xiao_long_bao", "Xiao long bao"),
                    ("har_gow", "Har gow"),
                    ("siu_mai", "Siu mai"),
                ),
            },
            Subcategory {
                id: "stir_fry",
                name: "Stir-fries",
                foods: foods!("chinese" / "stir_fry":
                    ("sweet_sour_pork", "Sweet and sour pork"),
                    ("kung_pao_chicken", "Kung pao chicken"),
                    ("mapo_tofu", "Mapo tofu"),
                    ("chili_shrimp", "Chili shrimp"),
                ),
            },
        ],
    },
    MenuSection {
        id: "japanese",
        name: "Japanese",
        emoji: "🍣",
        subcategories: &[
            Subcategory {
                id: "sushi",
                name: "Sushi and sashimi",
                foods: foods!("japanese" / "sushi":
                    ("sushi", "Sushi"),
                    ("sashimi", "Sashimi"),
                    ("chirashi", "Chirashi"),
                    ("salmon_sashimi", "Salmon sashimi"),
                    ("tuna_sashimi", "Tuna sashimi"),
                ),
            },
            Subcategory {
                id: "noodles",
                name: "Noodles",
                foods: foods!("japanese" / "noodles":
                    ("ramen", "Ramen"),
                    ("udon", "Udon"),
                    ("soba", "Soba"),
                    ("yakisoba", "Yakisoba"),
                ),
            },
            Subcategory {
                id: "rice_bowls",
                name: "Rice bowls",
                foods: foods!("japanese" / "rice_bowls":
                    ("katsu_don", "Katsudon"),
                    ("oyako_don", "Oyakodon"),
                    ("gyudon", "Gyudon"),
                    ("unagi_don", "Unagi don"),
                ),
            },
            Subcategory {
                id: "fried",
                name: "Fried",
                foods: foods!("japanese" / "fried":
                    ("tempura", "Tempura"),
                    ("tonkatsu", "Tonkatsu"),
                    ("chicken_katsu", "Chicken katsu"),
                    ("ebi_fry", "Fried shrimp"),
                ),
            },
        ],
    },
    MenuSection {
        id: "western",
        name: "Western",
        emoji: "🍝",
        subcategories: &[
            Subcategory {
                id: "pasta",
                name: "Pasta",
                foods: foods!("western" / "pasta":
                    ("spaghetti", "Spaghetti"),
                    ("carbonara", "Carbonara"),
                    ("bolognese", "Bolognese"),
                    ("aglio_olio", "Aglio e olio"),
                    ("penne_arrabbiata", "Penne arrabbiata"),
                ),
            },
            Subcategory {
                id: "pizza",
                name: "Pizza",
                foods: foods!("western" / "pizza":
                    ("margherita", "Margherita"),
                    ("pepperoni", "Pepperoni"),
                    ("hawaiian", "Hawaiian"),
                    ("quattro_cheese", "Quattro formaggi"),
                ),
            },
            Subcategory {
                id: "steak",
                name: "Steak",
                foods: foods!("western" / "steak":
                    ("ribeye", "Ribeye steak"),
                    ("sirloin", "Sirloin steak"),
                    ("tenderloin", "Tenderloin steak"),
                    ("tbone", "T-bone steak"),
                ),
            },
            Subcategory {
                id: "other",
                name: "Other",
                foods: foods!("western" / "other":
                    ("risotto", "Risotto"),
                    ("fish_chips", "Fish and chips"),
                    ("lasagna", "Lasagna"),
                    ("hamburg_steak", "Hamburg steak"),
                ),
            },
        ],
    },
    MenuSection {
        id: "asian",
        name: "Asian",
        emoji: "🍜",
        subcategories: &[
            Subcategory {
                id: "thai",
                name: "Thai",
                foods: foods!("asian" / "thai":
                    ("pad_thai", "Pad thai"),
                    ("tom_yum", "Tom yum goong"),
                    ("green_curry", "Green curry"),
                    ("mango_sticky_rice", "Mango sticky rice"),
                ),
            },
            Subcategory {
                id: "vietnamese",
                name: "Vietnamese",
                foods: foods!("asian" / "vietnamese":
                    ("pho", "Pho"),
                    ("banh_mi", "Banh mi"),
                    ("bun_bo_hue", "Bun bo Hue"),
                ),
            },
            Subcategory {
                id: "indian",
                name: "Indian",
                foods: foods!("asian" / "indian":
                    ("curry", "Curry"),
                    ("biryani", "Biryani"),
                    ("naan", "Naan"),
                    ("tandoori", "Tandoori"),
                ),
            },
        ],
    },
    MenuSection {
        id: "other",
        name: "Other",
        emoji: "🍽️",
        subcategories: &[
            Subcategory {
                id: "fast_food",
                name: "Fast food",
                foods: foods!("other" / "fast_food":
                    ("burger", "Burger"),
                    ("fried_chicken", "Fried chicken"),
                    ("hot_dog", "Hot dog"),
                    ("sandwich", "Sandwich"),
                ),
            },
            Subcategory {
                id: "cafe",
                name: "Cafe and dessert",
                foods: foods!("other" / "cafe":
                    ("coffee", "Coffee"),
                    ("cake", "Cake"),
                    ("ice_cream", "Ice cream"),
                    ("croissant", "Croissant"),
                ),
            },
            Subcategory {
                id: "snacks",
                name: "Street snacks",
                foods: foods!("other" / "snacks":
                    ("tteokbokki", "Tteokbokki"),
                    ("kimbap", "Kimbap"),
                    ("sundae", "Blood sausage"),
                    ("hotteok", "Sweet pancake"),
                ),
            },
        ],
    },
];

pub fn section(id: &str) -> Option<&'static MenuSection> {
    MENU.iter().find(|section| section.id == id)
}

/// Every dish on the menu, in menu order.
pub fn all_foods() -> impl Iterator<Item = &'static FoodItem> {
    MENU.iter().flat_map(MenuSection::foods)
}

/// Dishes whose name contains `query`, ignoring case. An empty query
/// matches everything.
pub fn search_foods(query: &str) -> Vec<&'static FoodItem> {
    let query = query.trim().to_lowercase();
    all_foods()
        .filter(|food| food.name.to_lowercase().contains(&query))
        .collect()
}

/// Look up a dish by ID.
pub fn food(id: &str) -> Option<&'static FoodItem> {
    all_foods().find(|food| food.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::model::catalog::Category;

    #[test]
    fn foods_are_filed_under_their_section() {
        for section in &MENU {
            for sub in section.subcategories {
                for food in sub.foods {
                    assert_eq!(food.category, section.id, "{}", food.id);
                    assert_eq!(food.subcategory, sub.id, "{}", food.id);
                }
            }
        }
    }

    #[test]
    fn food_ids_are_unique() {
        let mut seen = HashSet::new();
        for food in all_foods() {
            assert!(seen.insert(food.id), "duplicate food {}", food.id);
        }
        assert_eq!(seen.len(), 99);
    }

    #[test]
    fn sections_map_onto_catalog() {
        let scoring: Vec<_> = MENU
            .iter()
            .filter(|section| section.id.parse::<Category>().is_ok())
            .map(|section| section.id)
            .collect();
        assert_eq!(scoring, ["korean", "chinese", "japanese", "western", "asian"]);
        assert!(section("other").is_some());
        assert!(section("fast").is_none());
    }

    #[test]
    fn lookups() {
        let japanese = section("japanese").unwrap();
        assert_eq!(japanese.foods().count(), 17);
        let noodles = japanese.subcategory("noodles").unwrap();
        assert_eq!(noodles.foods.len(), 4);
        assert!(japanese.subcategory("pizza").is_none());

        assert_eq!(food("ramen").unwrap().category, "japanese");
        assert_eq!(food("fried_chicken").unwrap().subcategory, "fast_food");
        assert!(food("haggis").is_none());
    }

    #[test]
    fn search_ignores_case() {
        let ids: Vec<_> = search_foods("FRIED").iter().map(|f| f.id).collect();
        assert_eq!(
            ids,
            [
                "kimchi_fried_rice",
                "dakgalbi",
                "fried_rice",
                "yangzhou_fried_rice",
                "seafood_fried_rice",
                "ebi_fry",
                "fried_chicken",
            ]
        );
        assert_eq!(search_foods("  Pho ").len(), 1);
        assert_eq!(search_foods("").len(), all_foods().count());
        assert!(search_foods("haggis").is_empty());
    }
}
