//! Demo catalog for development databases and tests.

use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set, TransactionTrait,
};

use crate::{
    auth::hash_password,
    entities::{actor, carousel, clip, comment, favorite, movie, movie_actor, user},
    error::AppResult,
    models::now_sec,
};

pub const DEMO_PHONE: &str = "13800138000";
pub const DEMO_PASSWORD: &str = "Aa123456";

struct DemoMovie {
    title: &'static str,
    kind: &'static str,
    score: f64,
    release_time: &'static str,
    duration: &'static str,
    director: &'static str,
    description: &'static str,
}

const MOVIES: &[DemoMovie] = &[
    DemoMovie {
        title: "流浪地球2",
        kind: "科幻/冒险",
        score: 9.4,
        release_time: "2023-01-22",
        duration: "173分钟",
        director: "郭帆",
        description: "太阳危机即将来袭，人类开启“流浪地球计划”。",
    },
    DemoMovie {
        title: "满江红",
        kind: "剧情/悬疑",
        score: 8.0,
        release_time: "2023-01-22",
        duration: "159分钟",
        director: "张艺谋",
        description: "南宋绍兴年间，一群义士铲奸除恶的故事。",
    },
    DemoMovie {
        title: "流浪地球",
        kind: "科幻/灾难",
        score: 7.9,
        release_time: "2019-02-05",
        duration: "125分钟",
        director: "郭帆",
        description: "太阳即将毁灭，人类在地球表面建造出巨大的推进器。",
    },
    DemoMovie {
        title: "战狼2",
        kind: "动作/战争",
        score: 7.1,
        release_time: "2017-07-27",
        duration: "123分钟",
        director: "吴京",
        description: "冷锋在非洲卷入一场叛乱，孤身犯险营救同胞。",
    },
    DemoMovie {
        title: "无间道",
        kind: "剧情/犯罪",
        score: 9.3,
        release_time: "2002-12-12",
        duration: "101分钟",
        director: "刘伟强",
        description: "警方卧底与黑帮卧底之间的较量。",
    },
    DemoMovie {
        title: "长津湖",
        kind: "历史/战争",
        score: 7.4,
        release_time: "2021-09-30",
        duration: "176分钟",
        director: "陈凯歌",
        description: "抗美援朝战争中的长津湖战役。",
    },
    DemoMovie {
        title: "攀登者",
        kind: "剧情/冒险",
        score: 6.3,
        release_time: "2019-09-30",
        duration: "125分钟",
        director: "李仁港",
        description: "中国登山队攀登珠穆朗玛峰的故事。",
    },
];

struct DemoActor {
    name: &'static str,
    birth: &'static str,
    birth_place: &'static str,
    intro: &'static str,
    /// Indexes into `MOVIES`.
    works: &'static [usize],
}

const ACTORS: &[DemoActor] = &[
    DemoActor {
        name: "吴京",
        birth: "1974-04-03",
        birth_place: "北京",
        intro: "中国内地男演员、导演，代表作《战狼》系列。",
        works: &[0, 2, 3, 5, 6, 1],
    },
    DemoActor {
        name: "刘德华",
        birth: "1961-09-27",
        birth_place: "香港",
        intro: "中国香港男演员、歌手，代表作《无间道》。",
        works: &[0, 4],
    },
    DemoActor {
        name: "沈腾",
        birth: "1979-10-23",
        birth_place: "黑龙江",
        intro: "中国内地喜剧男演员。",
        works: &[1],
    },
    DemoActor {
        name: "易烊千玺",
        birth: "2000-11-28",
        birth_place: "湖南",
        intro: "中国内地男演员、歌手。",
        works: &[1, 5],
    },
];

/// Inserts the demo catalog and demo user unless the movies table already
/// has rows. Returns whether anything was written.
pub async fn seed_demo_data(db: &DatabaseConnection, bcrypt_cost: u32) -> AppResult<bool> {
    if movie::Entity::find().count(db).await? > 0 {
        tracing::debug!("movies present, skipping demo seed");
        return Ok(false);
    }

    let password = hash_password(DEMO_PASSWORD, bcrypt_cost).await?;
    let now = now_sec();
    let txn = db.begin().await?;

    let mut movie_ids = Vec::with_capacity(MOVIES.len());
    for (i, m) in MOVIES.iter().enumerate() {
        let inserted = movie::ActiveModel {
            title: Set(m.title.to_string()),
            kind: Set(m.kind.to_string()),
            score: Set(m.score),
            status: Set("全1集".to_string()),
            cover: Set(format!("/assets/images/movie{}.jpg", i + 1)),
            release_time: Set(m.release_time.to_string()),
            duration: Set(m.duration.to_string()),
            director: Set(m.director.to_string()),
            description: Set(m.description.to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        movie_ids.push(inserted.id);
    }

    for (i, a) in ACTORS.iter().enumerate() {
        let inserted = actor::ActiveModel {
            name: Set(a.name.to_string()),
            avatar: Set(Some(format!("/assets/images/actor{}.jpg", i + 1))),
            birth: Set(Some(a.birth.to_string())),
            birth_place: Set(Some(a.birth_place.to_string())),
            intro: Set(Some(a.intro.to_string())),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for &work in a.works {
            movie_actor::Entity::insert(movie_actor::ActiveModel {
                movie_id: Set(movie_ids[work]),
                actor_id: Set(inserted.id),
            })
            .exec_without_returning(&txn)
            .await?;
        }
    }

    for (order, &movie_id) in movie_ids.iter().take(3).enumerate() {
        carousel::ActiveModel {
            movie_id: Set(movie_id),
            sort_order: Set(order as i32),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    for (order, title) in ["官方预告", "幕后花絮"].into_iter().enumerate() {
        clip::ActiveModel {
            movie_id: Set(movie_ids[0]),
            title: Set(title.to_string()),
            cover: Set(Some(format!("/assets/images/clip{}.jpg", order + 1))),
            video_url: Set(format!("https://video.example.com/clips/{}.mp4", order + 1)),
            duration: Set(Some("02:30".to_string())),
            sort_order: Set(order as i32),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    let demo_user = user::ActiveModel {
        phone: Set(DEMO_PHONE.to_string()),
        password: Set(password),
        nickname: Set("电影爱好者".to_string()),
        avatar: Set(Some("/assets/images/default-avatar.jpg".to_string())),
        register_time: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    favorite::ActiveModel {
        user_id: Set(demo_user.id),
        movie_id: Set(movie_ids[0]),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    comment::ActiveModel {
        movie_id: Set(movie_ids[0]),
        user_id: Set(demo_user.id),
        content: Set("太震撼了！国产科幻的天花板".to_string()),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    tracing::info!(movies = movie_ids.len(), actors = ACTORS.len(), "seeded demo data");
    Ok(true)
}
